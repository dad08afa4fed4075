//! Command-line argument definitions

use clap::{Parser, Subcommand, ValueEnum};
use miette::{miette, Result};

use crate::cli::commands::checkin::CheckinCommands;
use crate::cli::commands::company::CompanyCommands;
use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::placement::PlacementCommands;
use crate::cli::commands::report::ReportCommands;
use crate::cli::commands::task::TaskCommands;
use crate::cli::commands::workflow::{CommentArgs, ReopenArgs, ReviewArgs, SubmitArgs};
use crate::core::team::{Actor, Role};

#[derive(Parser, Debug)]
#[command(name = "idesk")]
#[command(author, version, about = "Internship desk - review workflows and geofenced attendance")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Acting user id
    #[arg(long, global = true, env = "IDESK_USER")]
    pub user: Option<String>,

    /// Role to act under (student, supervisor, lecturer, hod, admin)
    #[arg(long, global = true, env = "IDESK_ROLE")]
    pub role: Option<Role>,

    /// Department of the acting user
    #[arg(long, global = true, env = "IDESK_DEPARTMENT")]
    pub department: Option<String>,

    /// Print debug logging to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

impl GlobalOpts {
    /// Resolve the acting identity; both user and role are required
    pub fn actor(&self) -> Result<Actor> {
        let user = self
            .user
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| miette!("No acting user. Pass --user or set IDESK_USER"))?;
        let role = self
            .role
            .ok_or_else(|| miette!("No acting role. Pass --role or set IDESK_ROLE"))?;

        let actor = Actor::new(user, role);
        Ok(match self.department.as_deref().map(str::trim) {
            Some(dept) if !dept.is_empty() => actor.with_department(dept),
            _ => actor,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML for single entities, TSV for lists
    #[default]
    Auto,
    Yaml,
    Json,
    Tsv,
    Csv,
    /// Boxed table
    Table,
    /// Entity ids only, one per line
    Id,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new project in the current directory
    Init(InitArgs),

    /// Daily task declarations
    #[command(subcommand)]
    Task(TaskCommands),

    /// Daily work reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Internship placements and the approval queue
    #[command(subcommand)]
    Placement(PlacementCommands),

    /// Attendance check-ins
    #[command(subcommand)]
    Checkin(CheckinCommands),

    /// Host companies and their geofences
    #[command(subcommand)]
    Company(CompanyCommands),

    /// Submit pending entities for review
    Submit(SubmitArgs),

    /// Approve entities
    Approve(ReviewArgs),

    /// Reject entities
    Reject(ReviewArgs),

    /// Leave a reviewer comment without deciding
    Comment(CommentArgs),

    /// Re-open an approved or rejected entity
    Reopen(ReopenArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
