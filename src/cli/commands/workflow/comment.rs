//! Comment command - reviewer feedback without a decision

use clap::Args;
use miette::{bail, IntoDiagnostic, Result};

use super::print_outcome;
use crate::cli::helpers::parse_id;
use crate::cli::{Desk, GlobalOpts};
use crate::core::identity::EntityPrefix;
use crate::entities::{DailyReport, DailyTask, Placement};

/// Leave a comment under your role without changing status
#[derive(Debug, Args)]
pub struct CommentArgs {
    /// Entity ID
    pub id: String,

    /// Comment text
    #[arg(long, short = 'm')]
    pub message: String,
}

impl CommentArgs {
    pub async fn run(&self, global: &GlobalOpts) -> Result<()> {
        let actor = global.actor()?;
        let desk = Desk::open()?;
        let id = parse_id(&self.id, None)?;
        let text = self.message.as_str();

        match id.prefix() {
            EntityPrefix::Task => {
                let e = desk
                    .engine
                    .save_comment::<DailyTask>(&id, &actor, text)
                    .await
                    .into_diagnostic()?;
                print_outcome(&e, "Commented on", global.format)
            }
            EntityPrefix::Rpt => {
                let e = desk
                    .engine
                    .save_comment::<DailyReport>(&id, &actor, text)
                    .await
                    .into_diagnostic()?;
                print_outcome(&e, "Commented on", global.format)
            }
            EntityPrefix::Plc => {
                let e: Placement = desk
                    .queue
                    .save_comment(&id, &actor, text)
                    .await
                    .into_diagnostic()?;
                print_outcome(&e, "Commented on", global.format)
            }
            EntityPrefix::Chk | EntityPrefix::Co => bail!(super::not_reviewable(&id)),
        }
    }
}
