//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::core::identity::EntityId;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Tsv
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Print one entity in an explicitly requested machine format
///
/// Returns `false` for `auto` and the tabular formats; the caller then prints
/// its human-readable view.
pub fn print_entity<T: Serialize>(entity: &T, id: &EntityId, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(entity).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(entity).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Id => {
            println!("{}", id);
            Ok(true)
        }
        OutputFormat::Auto | OutputFormat::Tsv | OutputFormat::Csv | OutputFormat::Table => Ok(false),
    }
}

/// Print a whole list as JSON or YAML; `false` means tabular output is wanted
pub fn print_collection<T: Serialize>(items: &[T], format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(items).into_diagnostic()?);
            Ok(true)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_format() {
        assert_eq!(effective_format(OutputFormat::Auto, true), OutputFormat::Tsv);
        assert_eq!(effective_format(OutputFormat::Auto, false), OutputFormat::Yaml);
        assert_eq!(effective_format(OutputFormat::Csv, false), OutputFormat::Csv);
    }
}
