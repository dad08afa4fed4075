//! Reopen command - return a finalized entity to pending (admin)

use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{bail, IntoDiagnostic, Result};
use std::io::IsTerminal;

use super::print_outcome;
use crate::cli::helpers::parse_id;
use crate::cli::{Desk, GlobalOpts};
use crate::core::identity::EntityPrefix;
use crate::entities::{DailyReport, DailyTask, Placement};

/// Re-open an approved or rejected entity
#[derive(Debug, Args)]
pub struct ReopenArgs {
    /// Entity ID
    pub id: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl ReopenArgs {
    pub async fn run(&self, global: &GlobalOpts) -> Result<()> {
        let actor = global.actor()?;
        let desk = Desk::open()?;
        let id = parse_id(&self.id, None)?;

        if !self.yes {
            if !std::io::stdin().is_terminal() {
                bail!("Refusing to re-open {} without confirmation; pass --yes", id);
            }
            let confirmed = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Re-open {} for another review cycle?", id))
                .default(false)
                .interact()
                .into_diagnostic()?;
            if !confirmed {
                println!("Cancelled.");
                return Ok(());
            }
        }

        match id.prefix() {
            EntityPrefix::Task => {
                let e = desk.engine.reopen::<DailyTask>(&id, &actor).await.into_diagnostic()?;
                print_outcome(&e, "Re-opened", global.format)
            }
            EntityPrefix::Rpt => {
                let e = desk.engine.reopen::<DailyReport>(&id, &actor).await.into_diagnostic()?;
                print_outcome(&e, "Re-opened", global.format)
            }
            EntityPrefix::Plc => {
                let e = desk.engine.reopen::<Placement>(&id, &actor).await.into_diagnostic()?;
                print_outcome(&e, "Re-opened", global.format)
            }
            EntityPrefix::Chk | EntityPrefix::Co => bail!(super::not_reviewable(&id)),
        }
    }
}
