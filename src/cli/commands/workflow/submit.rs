//! Submit command - move pending entities into review

use clap::Args;
use miette::Result;

use super::{finish, not_reviewable, parse_all, print_failure, print_outcome};
use crate::cli::{Desk, GlobalOpts};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::{DailyReport, DailyTask, Placement};

/// Submit pending entities for review (owner only)
#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Entity IDs to submit (accepts multiple, or - for stdin)
    #[arg(required = true)]
    pub ids: Vec<String>,
}

impl SubmitArgs {
    pub async fn run(&self, global: &GlobalOpts) -> Result<()> {
        let actor = global.actor()?;
        let desk = Desk::open()?;
        let ids = parse_all(&self.ids)?;

        let mut failures = 0;
        for id in &ids {
            if let Err(msg) = submit_one(&desk, id, &actor, global).await {
                print_failure(id, &msg);
                failures += 1;
            }
        }
        finish(failures, ids.len(), "submitted")
    }
}

async fn submit_one(
    desk: &Desk,
    id: &EntityId,
    actor: &crate::core::team::Actor,
    global: &GlobalOpts,
) -> std::result::Result<(), String> {
    let format = global.format;
    let printed = match id.prefix() {
        EntityPrefix::Task => desk
            .engine
            .submit::<DailyTask>(id, actor)
            .await
            .map(|e| print_outcome(&e, "Submitted", format)),
        EntityPrefix::Rpt => desk
            .engine
            .submit::<DailyReport>(id, actor)
            .await
            .map(|e| print_outcome(&e, "Submitted", format)),
        EntityPrefix::Plc => desk
            .engine
            .submit::<Placement>(id, actor)
            .await
            .map(|e| print_outcome(&e, "Submitted", format)),
        EntityPrefix::Chk | EntityPrefix::Co => return Err(not_reviewable(id)),
    };
    match printed {
        Ok(Ok(())) => Ok(()),
        Ok(Err(report)) => Err(report.to_string()),
        Err(e) => Err(e.to_string()),
    }
}
