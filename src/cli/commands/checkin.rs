//! `idesk checkin` command - attendance check-ins

use clap::Subcommand;
use console::style;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::filters::{VerdictArg, VerificationFilter};
use crate::cli::helpers::{parse_id, warn_placement_check};
use crate::cli::output::{effective_format, print_collection, print_entity};
use crate::cli::table::ListTable;
use crate::cli::{Desk, GlobalOpts, OutputFormat};
use crate::core::attendance::CheckInRequest;
use crate::core::geofence::{Coordinates, GeofenceClass, LocationEvidence};
use crate::core::identity::EntityPrefix;
use crate::core::workflow::WorkflowError;
use crate::entities::checkin::{CheckIn, VerificationStatus};

#[derive(Subcommand, Debug)]
pub enum CheckinCommands {
    /// Check in at a company site
    New(NewArgs),

    /// List check-ins
    List(ListArgs),

    /// Show a check-in's details
    Show(ShowArgs),

    /// Record a supervisor's verdict (supervisor)
    Verify(VerifyArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Company ID
    #[arg(long, short = 'c')]
    pub company: String,

    /// Device latitude
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Device longitude
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Why no coordinates are available
    #[arg(long, short = 'r')]
    pub reason: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only check-ins by this student (defaults to the acting student)
    #[arg(long, short = 'o')]
    pub student: Option<String>,

    /// Filter by supervisor verification
    #[arg(long)]
    pub verification: Option<VerificationFilter>,

    /// Only check-ins that need a supervisor's attention
    #[arg(long)]
    pub attention: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Check-in ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    /// Check-in ID
    pub id: String,

    /// Verdict to record
    #[arg(value_enum)]
    pub verdict: VerdictArg,

    /// Supervisor comment
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

pub async fn run(cmd: CheckinCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CheckinCommands::New(args) => run_new(args, global).await,
        CheckinCommands::List(args) => run_list(args, global).await,
        CheckinCommands::Show(args) => run_show(args, global).await,
        CheckinCommands::Verify(args) => run_verify(args, global).await,
    }
}

async fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let actor = global.actor()?;
    let desk = Desk::open()?;
    let company_id = parse_id(&args.company, Some(EntityPrefix::Co))?;

    let coordinates = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Some(
            Coordinates::new(lat, lng)
                .map_err(WorkflowError::from)
                .into_diagnostic()?,
        ),
        _ => None,
    };
    let evidence = LocationEvidence {
        coordinates,
        manual_reason: args.reason,
    };

    let checkin = desk
        .attendance
        .create_check_in(&actor, CheckInRequest { company_id, evidence })
        .await
        .into_diagnostic()?;

    if !print_entity(&checkin, &checkin.id, global.format)? {
        println!(
            "{} Checked in {} ({})",
            style("✓").green(),
            style(&checkin.id).cyan(),
            describe_class(&checkin)
        );
    }
    if checkin.geofence.is_outside_geofence() {
        eprintln!(
            "{} Outside the company geofence; your supervisor will review this check-in",
            style("!").yellow()
        );
    }
    warn_placement_check(checkin.placement_check);
    Ok(())
}

fn describe_class(checkin: &CheckIn) -> String {
    match (checkin.geofence.class(), checkin.geofence.distance_meters()) {
        (GeofenceClass::GpsInside, Some(d)) => {
            style(format!("inside geofence, {:.0} m", d)).green().to_string()
        }
        (GeofenceClass::GpsOutside, Some(d)) => format!(
            "{} ({:.0} m, radius {:.0} m)",
            style("outside geofence").red(),
            d,
            checkin.geofence.radius_meters()
        ),
        (GeofenceClass::Manual, _) => style("manual check-in").yellow().to_string(),
        (class, None) => class.to_string(),
    }
}

async fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let desk = Desk::open()?;

    let mut checkins = match (args.student, args.verification) {
        (Some(student), _) => desk
            .attendance
            .list_check_ins_for(&student)
            .await
            .into_diagnostic()?,
        (None, Some(v)) => desk
            .attendance
            .list_check_ins_by_verification(v.into())
            .await
            .into_diagnostic()?,
        (None, None) => {
            let actor = global
                .actor()
                .map_err(|_| miette!("Pass --student or --verification, or act as a student"))?;
            desk.attendance
                .list_check_ins_for(&actor.id)
                .await
                .into_diagnostic()?
        }
    };
    if let Some(v) = args.verification {
        let wanted: VerificationStatus = v.into();
        checkins.retain(|c| c.supervisor_verification_status == wanted);
    }
    if args.attention {
        checkins.retain(CheckIn::needs_attention);
    }

    let format = effective_format(global.format, true);
    if print_collection(&checkins, format)? {
        return Ok(());
    }
    if checkins.is_empty() && format != OutputFormat::Id {
        println!("No check-ins found.");
        return Ok(());
    }

    let mut table = ListTable::new(
        &["id", "time", "student", "company", "class", "distance", "verification"],
        "check-in",
    );
    for c in &checkins {
        table.push(vec![
            c.id.to_string(),
            c.timestamp_utc.format("%Y-%m-%d %H:%M").to_string(),
            c.student_id.clone(),
            c.company_id.to_string(),
            c.geofence.class().to_string(),
            c.geofence
                .distance_meters()
                .map(|d| format!("{:.0}", d))
                .unwrap_or_default(),
            c.supervisor_verification_status.to_string(),
        ]);
    }
    table.print(format)
}

async fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let desk = Desk::open()?;
    let id = parse_id(&args.id, Some(EntityPrefix::Chk))?;
    let c = desk.attendance.get_check_in(&id).await.into_diagnostic()?;

    if print_entity(&c, &c.id, global.format)? {
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&c.id).cyan());
    println!("{}: {}", style("Student").bold(), c.student_id);
    println!("{}: {}", style("Company").bold(), c.company_id);
    println!(
        "{}: {}",
        style("Time").bold(),
        c.timestamp_utc.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{}: {}", style("Location").bold(), describe_class(&c));
    if let Some(address) = c.geofence.resolved_address() {
        println!("{}: {}", style("Address").bold(), address);
    }
    if let Some(reason) = c.geofence.manual_reason() {
        println!("{}: {}", style("Reason").bold(), reason);
    }
    println!("{}: {}", style("Placement").bold(), c.placement_check);
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("Verification").bold(),
        c.supervisor_verification_status
    );
    if let Some(ref by) = c.verified_by {
        println!("{}: {}", style("Verified by").bold(), by);
    }
    if let Some(ref comment) = c.supervisor_comment {
        println!("{}: {}", style("Comment").bold(), comment);
    }
    Ok(())
}

async fn run_verify(args: VerifyArgs, global: &GlobalOpts) -> Result<()> {
    let actor = global.actor()?;
    let desk = Desk::open()?;
    let id = parse_id(&args.id, Some(EntityPrefix::Chk))?;

    let checkin = desk
        .attendance
        .set_check_in_verification(&id, &actor, args.verdict.into(), args.message.as_deref())
        .await
        .into_diagnostic()?;

    if !print_entity(&checkin, &checkin.id, global.format)? {
        println!(
            "{} {} marked {}",
            style("✓").green(),
            style(&checkin.id).cyan(),
            checkin.supervisor_verification_status
        );
    }
    Ok(())
}
