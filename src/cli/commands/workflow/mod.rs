//! Review workflow commands that work across entity kinds
//!
//! Each command takes one or more ids (or `-` to read them from stdin) and
//! routes every id to the right entity kind by its prefix.

mod comment;
mod reopen;
mod review;
mod submit;

pub use comment::CommentArgs;
pub use reopen::ReopenArgs;
pub use review::ReviewArgs;
pub use submit::SubmitArgs;

use console::style;
use miette::{bail, Result};

use crate::cli::helpers::{collect_ids, parse_id, styled_status};
use crate::cli::output::print_entity;
use crate::cli::OutputFormat;
use crate::core::entity::Reviewable;
use crate::core::identity::EntityId;

/// Print the outcome of one transition
pub(crate) fn print_outcome<T: Reviewable>(entity: &T, verb: &str, format: OutputFormat) -> Result<()> {
    if !print_entity(entity, entity.id(), format)? {
        println!(
            "{} {} {} ({})",
            style("✓").green(),
            verb,
            style(entity.id()).cyan(),
            styled_status(entity.review_state().status)
        );
    }
    Ok(())
}

/// Parse every id up front so a typo aborts before anything changes
pub(crate) fn parse_all(raw: &[String]) -> Result<Vec<EntityId>> {
    let ids = collect_ids(raw)?;
    if ids.is_empty() {
        bail!("No entity IDs given");
    }
    ids.iter().map(|s| parse_id(s, None)).collect()
}

/// Report per-id failures and fail the command if there were any
pub(crate) fn finish(failures: usize, total: usize, verb: &str) -> Result<()> {
    if failures == 0 {
        return Ok(());
    }
    bail!("{} of {} entities could not be {}", failures, total, verb)
}

pub(crate) fn print_failure(id: &EntityId, err: &dyn std::fmt::Display) {
    eprintln!("{} {}: {}", style("✗").red(), id, err);
}

pub(crate) fn not_reviewable(id: &EntityId) -> String {
    format!("{} entities have no review workflow", id.prefix().name())
}
