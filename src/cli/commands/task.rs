//! `idesk task` command - daily task declarations

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::filters::StatusFilter;
use crate::cli::helpers::{parse_id, print_review_state, truncate_str, warn_placement_check};
use crate::cli::output::{effective_format, print_collection, print_entity};
use crate::cli::table::ListTable;
use crate::cli::{Desk, GlobalOpts};
use crate::core::entity::BlobRef;
use crate::core::identity::EntityPrefix;
use crate::entities::task::{DailyTask, TaskDraft};
use crate::store::EntityFilter;

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Declare a task for a working day
    New(NewArgs),

    /// List tasks with filtering
    List(ListArgs),

    /// Show a task's details
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Day the work was done (YYYY-MM-DD, default today)
    #[arg(long, short = 'd')]
    pub date: Option<NaiveDate>,

    /// What was done
    #[arg(long, short = 'D')]
    pub description: Option<String>,

    /// Results of the work
    #[arg(long)]
    pub outcomes: Option<String>,

    /// Learning objectives addressed
    #[arg(long)]
    pub learning_objectives: Option<String>,

    /// Attachment references (repeatable)
    #[arg(long = "attach")]
    pub attachments: Vec<String>,

    /// Prompt for missing fields
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only tasks owned by this student
    #[arg(long, short = 'o')]
    pub owner: Option<String>,

    /// Only tasks owned by the acting user
    #[arg(long)]
    pub mine: bool,

    /// Filter by review status
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,

    /// Only tasks flagged outside an approved placement
    #[arg(long)]
    pub flagged: bool,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Task ID
    pub id: String,
}

pub async fn run(cmd: TaskCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TaskCommands::New(args) => run_new(args, global).await,
        TaskCommands::List(args) => run_list(args, global).await,
        TaskCommands::Show(args) => run_show(args, global).await,
    }
}

async fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let actor = global.actor()?;
    let desk = Desk::open()?;
    let theme = ColorfulTheme::default();

    let description = match args.description {
        Some(d) => d,
        None if args.interactive => Input::with_theme(&theme)
            .with_prompt("What did you work on?")
            .interact_text()
            .into_diagnostic()?,
        None => return Err(miette!("Description is required (use --description or -i)")),
    };
    let outcomes = match args.outcomes {
        Some(o) => o,
        None if args.interactive => Input::with_theme(&theme)
            .with_prompt("Outcomes (optional)")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?,
        None => String::new(),
    };

    let draft = TaskDraft {
        date: args.date.unwrap_or_else(|| chrono::Local::now().date_naive()),
        description,
        outcomes,
        learning_objectives: args.learning_objectives.unwrap_or_default(),
        attachments: args.attachments.into_iter().map(BlobRef::new).collect(),
    };

    let task = desk.engine.create_task(&actor, draft).await.into_diagnostic()?;

    if !print_entity(&task, &task.id, global.format)? {
        println!(
            "{} Created task {}",
            style("✓").green(),
            style(&task.id).cyan()
        );
    }
    warn_placement_check(task.placement_check);
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

    let tasks: Vec<DailyTask> = desk
        .engine
        .list::<DailyTask>(&filter)
        .await
        .into_diagnostic()?
        .into_iter()
        .filter(|t| args.status.matches(t.review.status))
        .filter(|t| !args.flagged || t.placement_check.is_flagged())
        .collect();

    if args.count {
        println!("{}", tasks.len());
        return Ok(());
    }

    let format = effective_format(global.format, true);
    if print_collection(&tasks, format)? {
        return Ok(());
    }
    if tasks.is_empty() && format != crate::cli::OutputFormat::Id {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = ListTable::new(
        &["id", "date", "student", "description", "status", "placement"],
        "task",
    );
    for task in &tasks {
        table.push(vec![
            task.id.to_string(),
            task.date.to_string(),
            task.student_id.clone(),
            truncate_str(&task.description, 40),
            task.review.status.to_string(),
            task.placement_check.to_string(),
        ]);
    }
    table.print(format)
}

async fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let desk = Desk::open()?;
    let id = parse_id(&args.id, Some(EntityPrefix::Task))?;
    let task: DailyTask = desk.engine.get(&id).await.into_diagnostic()?;

    if print_entity(&task, &task.id, global.format)? {
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&task.id).cyan());
    println!("{}: {}", style("Student").bold(), task.student_id);
    println!("{}: {}", style("Date").bold(), task.date);
    println!("{}: {}", style("Placement").bold(), task.placement_check);
    println!("{}", style("─".repeat(60)).dim());
    println!();
    println!("{}", style("Description:").bold());
    println!("{}", task.description);
    if !task.outcomes.is_empty() {
        println!();
        println!("{}", style("Outcomes:").bold());
        println!("{}", task.outcomes);
    }
    if !task.learning_objectives.is_empty() {
        println!();
        println!("{}", style("Learning objectives:").bold());
        println!("{}", task.learning_objectives);
    }
    if !task.attachments.is_empty() {
        println!();
        println!("{}", style("Attachments:").bold());
        for a in &task.attachments {
            println!("  • {}", a);
        }
    }
    println!();
    print_review_state(&task.review);
    Ok(())
}
