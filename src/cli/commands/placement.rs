//! `idesk placement` command - placements and the HOD approval queue

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::filters::{DecisionArg, StatusFilter};
use crate::cli::helpers::{parse_id, print_review_state, styled_status, truncate_str};
use crate::cli::output::{effective_format, print_collection, print_entity};
use crate::cli::table::ListTable;
use crate::cli::{Desk, GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::entities::placement::{Placement, PlacementDraft};
use crate::store::EntityFilter;

#[derive(Subcommand, Debug)]
pub enum PlacementCommands {
    /// Declare a placement and queue it for approval
    New(NewArgs),

    /// List placements with filtering
    List(ListArgs),

    /// Show a placement's details
    Show(ShowArgs),

    /// Show the approval queue, oldest submission first
    Queue(QueueArgs),

    /// Approve or reject a queued placement (head of department)
    Review(ReviewArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Registered company ID (fills in the company name)
    #[arg(long, short = 'c')]
    pub company: Option<String>,

    /// Company name, when the company is not registered
    #[arg(long)]
    pub company_name: Option<String>,

    /// How to reach the workplace supervisor
    #[arg(long, short = 's')]
    pub supervisor_contact: String,

    /// User id of the supervisor who verifies check-ins
    #[arg(long)]
    pub supervisor_id: Option<String>,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only placements owned by this student
    #[arg(long, short = 'o')]
    pub owner: Option<String>,

    /// Filter by review status
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Placement ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct QueueArgs {
    /// Only placements for this department (defaults to --department)
    #[arg(long)]
    pub dept: Option<String>,

    /// Include every department
    #[arg(long, conflicts_with = "dept")]
    pub all: bool,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ReviewArgs {
    /// Placement ID
    pub id: String,

    /// Decision to record
    #[arg(value_enum)]
    pub decision: DecisionArg,

    /// Comment stored under the reviewer's role
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

pub async fn run(cmd: PlacementCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PlacementCommands::New(args) => run_new(args, global).await,
        PlacementCommands::List(args) => run_list(args, global).await,
        PlacementCommands::Show(args) => run_show(args, global).await,
        PlacementCommands::Queue(args) => run_queue(args, global).await,
        PlacementCommands::Review(args) => run_review(args, global).await,
    }
}

async fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let actor = global.actor()?;
    let desk = Desk::open()?;

    let (company_id, company_name) = match (&args.company, args.company_name) {
        (Some(raw), name) => {
            let id = parse_id(raw, Some(EntityPrefix::Co))?;
            let company = desk.attendance.get_company(&id).await.into_diagnostic()?;
            (Some(company.id), name.unwrap_or(company.name))
        }
        (None, Some(name)) => (None, name),
        (None, None) => {
            return Err(miette!(
                "Company is required (use --company <CO-ID> or --company-name)"
            ))
        }
    };

    let draft = PlacementDraft {
        company_name,
        supervisor_contact: args.supervisor_contact,
        start_date: args.start,
        end_date: args.end,
        department: actor.department.clone(),
        company_id,
        supervisor_id: args.supervisor_id,
    };

    let placement = desk
        .queue
        .create_placement(&actor, draft)
        .await
        .into_diagnostic()?;

    if !print_entity(&placement, &placement.id, global.format)? {
        println!(
            "{} Created placement {} ({})",
            style("✓").green(),
            style(&placement.id).cyan(),
            styled_status(placement.review.status)
        );
    }
    Ok(())
}

fn placement_rows(placements: &[Placement]) -> ListTable {
    let mut table = ListTable::new(
        &["id", "student", "company", "start", "end", "department", "status"],
        "placement",
    );
    for p in placements {
        table.push(vec![
            p.id.to_string(),
            p.student_id.clone(),
            truncate_str(&p.company_name, 30),
            p.start_date.to_string(),
            p.end_date.to_string(),
            p.department.clone().unwrap_or_default(),
            p.review.status.to_string(),
        ]);
    }
    table
}

async fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let desk = Desk::open()?;
    let filter = EntityFilter {
        owner: args.owner,
        status: args.status.as_status(),
    };
    let placements: Vec<Placement> = desk
        .engine
        .list::<Placement>(&filter)
        .await
        .into_diagnostic()?
        .into_iter()
        .filter(|p| args.status.matches(p.review.status))
        .collect();

    let format = effective_format(global.format, true);
    if print_collection(&placements, format)? {
        return Ok(());
    }
    if placements.is_empty() && format != OutputFormat::Id {
        println!("No placements found.");
        return Ok(());
    }
    placement_rows(&placements).print(format)
}

async fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let desk = Desk::open()?;
    let id = parse_id(&args.id, Some(EntityPrefix::Plc))?;
    let p: Placement = desk.engine.get(&id).await.into_diagnostic()?;

    if print_entity(&p, &p.id, global.format)? {
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&p.id).cyan());
    println!("{}: {}", style("Student").bold(), p.student_id);
    println!("{}: {}", style("Company").bold(), style(&p.company_name).yellow());
    if let Some(ref company_id) = p.company_id {
        println!("{}: {}", style("Company ID").bold(), company_id);
    }
    println!("{}: {}", style("Supervisor").bold(), p.supervisor_contact);
    if let Some(ref sup) = p.supervisor_id {
        println!("{}: {}", style("Supervisor ID").bold(), sup);
    }
    println!("{}: {} to {}", style("Window").bold(), p.start_date, p.end_date);
    if let Some(ref dept) = p.department {
        println!("{}: {}", style("Department").bold(), dept);
    }
    println!("{}", style("─".repeat(60)).dim());
    print_review_state(&p.review);
    Ok(())
}

async fn run_queue(args: QueueArgs, global: &GlobalOpts) -> Result<()> {
    let desk = Desk::open()?;
    let department = if args.all {
        None
    } else {
        args.dept.or_else(|| global.department.clone())
    };

    let pending = match department.as_deref() {
        Some(dept) => desk
            .queue
            .list_pending_for_department(dept)
            .await
            .into_diagnostic()?,
        None => desk.queue.list_pending().await.into_diagnostic()?,
    };

    if args.count {
        println!("{}", pending.len());
        return Ok(());
    }

    let format = effective_format(global.format, true);
    if print_collection(&pending, format)? {
        return Ok(());
    }
    if pending.is_empty() && format != OutputFormat::Id {
        println!("Approval queue is empty.");
        return Ok(());
    }
    placement_rows(&pending).print(format)
}

async fn run_review(args: ReviewArgs, global: &GlobalOpts) -> Result<()> {
    let actor = global.actor()?;
    let desk = Desk::open()?;
    let id = parse_id(&args.id, Some(EntityPrefix::Plc))?;

    let placement = desk
        .queue
        .review_placement(&id, &actor, args.decision.into(), args.message.as_deref())
        .await
        .into_diagnostic()?;

    if !print_entity(&placement, &placement.id, global.format)? {
        println!(
            "{} {} is now {}",
            style("✓").green(),
            style(&placement.id).cyan(),
            styled_status(placement.review.status)
        );
    }
    Ok(())
}
