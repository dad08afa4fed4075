//! `idesk report` command - daily work reports

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::filters::StatusFilter;
use crate::cli::helpers::{parse_id, print_review_state, truncate_str, warn_placement_check};
use crate::cli::output::{effective_format, print_collection, print_entity};
use crate::cli::table::ListTable;
use crate::cli::{Desk, GlobalOpts, OutputFormat};
use crate::core::entity::BlobRef;
use crate::core::identity::EntityPrefix;
use crate::entities::report::{DailyReport, ReportDraft};
use crate::store::EntityFilter;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// File a report
    New(NewArgs),

    /// List reports with filtering
    List(ListArgs),

    /// Show a report's details
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Report date (YYYY-MM-DD, default today)
    #[arg(long, short = 'd')]
    pub date: Option<NaiveDate>,

    /// Report title
    #[arg(long, short = 'T')]
    pub title: Option<String>,

    /// Body of the report
    #[arg(long, short = 'D')]
    pub description: Option<String>,

    /// Challenges faced
    #[arg(long)]
    pub challenges: Option<String>,

    /// Learning objectives addressed
    #[arg(long)]
    pub learning_objectives: Option<String>,

    /// Attachment references (repeatable)
    #[arg(long = "attach")]
    pub attachments: Vec<String>,

    /// Reference to a photo taken with the secure camera
    #[arg(long)]
    pub photo: Option<String>,

    /// Prompt for missing fields
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only reports owned by this student
    #[arg(long, short = 'o')]
    pub owner: Option<String>,

    /// Only reports owned by the acting user
    #[arg(long)]
    pub mine: bool,

    /// Filter by review status
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Report ID
    pub id: String,
}

pub async fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::New(args) => run_new(args, global).await,
        ReportCommands::List(args) => run_list(args, global).await,
        ReportCommands::Show(args) => run_show(args, global).await,
    }
}

fn prompt(theme: &ColorfulTheme, label: &str) -> Result<String> {
    Input::with_theme(theme)
        .with_prompt(label)
        .interact_text()
        .into_diagnostic()
}

async fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let actor = global.actor()?;
    let desk = Desk::open()?;
    let theme = ColorfulTheme::default();

    let title = match args.title {
        Some(t) => t,
        None if args.interactive => prompt(&theme, "Title")?,
        None => return Err(miette!("Title is required (use --title or -i)")),
    };
    let description = match args.description {
        Some(d) => d,
        None if args.interactive => prompt(&theme, "Description")?,
        None => return Err(miette!("Description is required (use --description or -i)")),
    };

    let draft = ReportDraft {
        date: args.date.unwrap_or_else(|| chrono::Local::now().date_naive()),
        title,
        description,
        challenges_faced: args.challenges,
        learning_objectives: args.learning_objectives.unwrap_or_default(),
        attachments: args.attachments.into_iter().map(BlobRef::new).collect(),
        secure_photo_ref: args.photo.map(BlobRef::new),
    };

    let report = desk.engine.create_report(&actor, draft).await.into_diagnostic()?;

    if !print_entity(&report, &report.id, global.format)? {
        println!(
            "{} Created report {}",
            style("✓").green(),
            style(&report.id).cyan()
        );
    }
    warn_placement_check(report.placement_check);
    Ok(())
}

async fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let desk = Desk::open()?;
    let owner = if args.mine {
        Some(global.actor()?.id)
    } else {
        args.owner
    };
    let filter = EntityFilter {
        owner,
        status: args.status.as_status(),
    };

    let reports: Vec<DailyReport> = desk
        .engine
        .list::<DailyReport>(&filter)
        .await
        .into_diagnostic()?
        .into_iter()
        .filter(|r| args.status.matches(r.review.status))
        .collect();

    if args.count {
        println!("{}", reports.len());
        return Ok(());
    }

    let format = effective_format(global.format, true);
    if print_collection(&reports, format)? {
        return Ok(());
    }
    if reports.is_empty() && format != OutputFormat::Id {
        println!("No reports found.");
        return Ok(());
    }

    let mut table = ListTable::new(&["id", "date", "student", "title", "status"], "report");
    for report in &reports {
        table.push(vec![
            report.id.to_string(),
            report.date.to_string(),
            report.student_id.clone(),
            truncate_str(&report.title, 40),
            report.review.status.to_string(),
        ]);
    }
    table.print(format)
}

async fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let desk = Desk::open()?;
    let id = parse_id(&args.id, Some(EntityPrefix::Rpt))?;
    let report: DailyReport = desk.engine.get(&id).await.into_diagnostic()?;

    if print_entity(&report, &report.id, global.format)? {
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&report.id).cyan());
    println!("{}: {}", style("Title").bold(), style(&report.title).yellow());
    println!("{}: {}", style("Student").bold(), report.student_id);
    println!("{}: {}", style("Date").bold(), report.date);
    println!("{}: {}", style("Placement").bold(), report.placement_check);
    if let Some(ref photo) = report.secure_photo_ref {
        println!("{}: {}", style("Photo").bold(), photo);
    }
    println!("{}", style("─".repeat(60)).dim());
    println!();
    println!("{}", report.description);
    if let Some(ref challenges) = report.challenges_faced {
        println!();
        println!("{}", style("Challenges:").bold());
        println!("{}", challenges);
    }
    if !report.learning_objectives.is_empty() {
        println!();
        println!("{}", style("Learning objectives:").bold());
        println!("{}", report.learning_objectives);
    }
    if !report.attachments.is_empty() {
        println!();
        println!("{}", style("Attachments:").bold());
        for a in &report.attachments {
            println!("  • {}", a);
        }
    }
    println!();
    print_review_state(&report.review);
    Ok(())
}
