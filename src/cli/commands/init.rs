//! `idesk init` command - create a project in the current directory

use clap::Args;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::identity::EntityPrefix;
use crate::core::project::Project;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Re-initialize an existing project (keeps existing files)
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let project = Project::init(&cwd, args.force).into_diagnostic()?;

    println!(
        "{} Initialized internship desk project in {}",
        style("✓").green(),
        style(project.root().display()).cyan()
    );
    println!("   {}", style(project.config_path().display()).dim());
    for prefix in EntityPrefix::all() {
        println!("   {}/", style(prefix.dir()).dim());
    }
    Ok(())
}
