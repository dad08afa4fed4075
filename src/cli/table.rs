//! Tabular list output (TSV, CSV, boxed tables and bare ids)

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

/// Rows of plain strings under fixed headers
///
/// The first column is always the entity id, which `--format id` prints alone.
pub struct ListTable {
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
    noun: &'static str,
}

impl ListTable {
    pub fn new(headers: &'static [&'static str], noun: &'static str) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            noun,
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table to stdout
    pub fn print(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Id => {
                for row in &self.rows {
                    if let Some(id) = row.first() {
                        println!("{}", id);
                    }
                }
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(std::io::stdout());
                writer.write_record(self.headers).into_diagnostic()?;
                for row in &self.rows {
                    writer.write_record(row).into_diagnostic()?;
                }
                writer.flush().into_diagnostic()?;
            }
            OutputFormat::Table => {
                println!("{}", self.render_boxed());
                self.print_summary();
            }
            _ => {
                println!("{}", self.headers.join("\t").to_uppercase());
                for row in &self.rows {
                    let cells: Vec<String> = row.iter().map(|c| c.replace(['\t', '\n'], " ")).collect();
                    println!("{}", cells.join("\t"));
                }
            }
        }
        Ok(())
    }

    fn render_boxed(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(|h| h.to_uppercase()));
        for row in &self.rows {
            builder.push_record(row.iter().cloned());
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }

    fn print_summary(&self) {
        println!();
        println!("{} {}(s) found", style(self.rows.len()).cyan(), self.noun);
    }
}
