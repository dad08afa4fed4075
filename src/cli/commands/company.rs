//! `idesk company` command - host companies and their geofences

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::truncate_str;
use crate::cli::output::{effective_format, print_collection, print_entity};
use crate::cli::table::ListTable;
use crate::cli::{Desk, GlobalOpts, OutputFormat};
use crate::entities::company::CompanyDraft;

#[derive(Subcommand, Debug)]
pub enum CompanyCommands {
    /// Register a company site (admin or head of department)
    Add(AddArgs),

    /// List registered companies
    List,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Company name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Latitude of the registered site
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude of the registered site
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Geofence radius in meters (default from config)
    #[arg(long)]
    pub radius: Option<f64>,

    /// Street address
    #[arg(long)]
    pub address: Option<String>,
}

pub async fn run(cmd: CompanyCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CompanyCommands::Add(args) => run_add(args, global).await,
        CompanyCommands::List => run_list(global).await,
    }
}

async fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let actor = global.actor()?;
    let desk = Desk::open()?;

    let draft = CompanyDraft {
        name: args.name,
        lat: args.lat,
        lng: args.lng,
        radius_meters: args.radius,
        address: args.address,
    };
    let company = desk
        .attendance
        .register_company(&actor, draft)
        .await
        .into_diagnostic()?;

    if !print_entity(&company, &company.id, global.format)? {
        println!(
            "{} Registered {} as {} (radius {} m)",
            style("✓").green(),
            style(&company.name).yellow(),
            style(&company.id).cyan(),
            company.radius_meters(desk.config.geofence.default_radius_meters)
        );
    }
    Ok(())
}

async fn run_list(global: &GlobalOpts) -> Result<()> {
    let desk = Desk::open()?;
    let companies = desk.attendance.list_companies().await.into_diagnostic()?;
    let default_radius = desk.config.geofence.default_radius_meters;

    let format = effective_format(global.format, true);
    if print_collection(&companies, format)? {
        return Ok(());
    }
    if companies.is_empty() && format != OutputFormat::Id {
        println!("No companies registered.");
        return Ok(());
    }

    let mut table = ListTable::new(&["id", "name", "coordinates", "radius"], "company");
    for c in &companies {
        table.push(vec![
            c.id.to_string(),
            truncate_str(&c.name, 30),
            c.registered_coordinates.to_string(),
            format!("{}", c.radius_meters(default_radius)),
        ]);
    }
    table.print(format)
}
