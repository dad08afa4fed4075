//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod desk;
pub mod filters;
pub mod helpers;
pub mod output;
pub mod table;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};
pub use desk::Desk;
pub use filters::{DecisionArg, StatusFilter, VerificationFilter};

use miette::Result;

/// Run one parsed command line
pub async fn dispatch(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Task(cmd) => commands::task::run(cmd, &global).await,
        Commands::Report(cmd) => commands::report::run(cmd, &global).await,
        Commands::Placement(cmd) => commands::placement::run(cmd, &global).await,
        Commands::Checkin(cmd) => commands::checkin::run(cmd, &global).await,
        Commands::Company(cmd) => commands::company::run(cmd, &global).await,
        Commands::Submit(args) => args.run(&global).await,
        Commands::Approve(args) => args.run(crate::core::Decision::Approved, &global).await,
        Commands::Reject(args) => args.run(crate::core::Decision::Rejected, &global).await,
        Commands::Comment(args) => args.run(&global).await,
        Commands::Reopen(args) => args.run(&global).await,
        Commands::Completions(args) => commands::completions::run(args),
    }
}
