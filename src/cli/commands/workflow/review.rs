//! Approve and reject commands

use clap::Args;
use miette::Result;

use super::{finish, not_reviewable, parse_all, print_failure, print_outcome};
use crate::cli::{Desk, GlobalOpts};
use crate::core::entity::Decision;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::team::Actor;
use crate::entities::{DailyReport, DailyTask};

/// Record a review decision on one or more entities
#[derive(Debug, Args)]
pub struct ReviewArgs {
    /// Entity IDs (accepts multiple, or - for stdin)
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Comment stored under the reviewer's role
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

impl ReviewArgs {
    pub async fn run(&self, decision: Decision, global: &GlobalOpts) -> Result<()> {
        let actor = global.actor()?;
        let desk = Desk::open()?;
        let ids = parse_all(&self.ids)?;
        let comment = self.message.as_deref();

        let mut failures = 0;
        for id in &ids {
            if let Err(msg) = review_one(&desk, id, &actor, decision, comment, global).await {
                print_failure(id, &msg);
                failures += 1;
            }
        }
        finish(failures, ids.len(), &decision.to_string())
    }
}

async fn review_one(
    desk: &Desk,
    id: &EntityId,
    actor: &Actor,
    decision: Decision,
    comment: Option<&str>,
    global: &GlobalOpts,
) -> std::result::Result<(), String> {
    let verb = match decision {
        Decision::Approved => "Approved",
        Decision::Rejected => "Rejected",
    };
    let format = global.format;
    let printed = match id.prefix() {
        EntityPrefix::Task => desk
            .engine
            .review::<DailyTask>(id, actor, decision, comment)
            .await
            .map(|e| print_outcome(&e, verb, format)),
        EntityPrefix::Rpt => desk
            .engine
            .review::<DailyReport>(id, actor, decision, comment)
            .await
            .map(|e| print_outcome(&e, verb, format)),
        // Placements go through the queue for the department check
        EntityPrefix::Plc => desk
            .queue
            .review_placement(id, actor, decision, comment)
            .await
            .map(|e| print_outcome(&e, verb, format)),
        EntityPrefix::Chk | EntityPrefix::Co => return Err(not_reviewable(id)),
    };
    match printed {
        Ok(Ok(())) => Ok(()),
        Ok(Err(report)) => Err(report.to_string()),
        Err(e) => Err(e.to_string()),
    }
}
