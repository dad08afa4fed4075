//! Shared helper functions for CLI commands

use console::style;
use miette::{miette, Result};
use std::io::{self, BufRead, IsTerminal};

use crate::core::entity::{PlacementCheck, ReviewState, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// Format an EntityId for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
pub fn format_short_id(id: &EntityId) -> String {
    let s = id.to_string();
    if s.len() > 16 {
        format!("{}...", &s[..13])
    } else {
        s
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse an id argument, optionally insisting on one kind
pub fn parse_id(raw: &str, expected: Option<EntityPrefix>) -> Result<EntityId> {
    let id: EntityId = raw
        .parse()
        .map_err(|e| miette!("Invalid ID '{}': {}", raw.trim(), e))?;
    match expected {
        Some(prefix) if id.prefix() != prefix => Err(miette!(
            "{} is not a {} ID (expected {}-...)",
            id,
            prefix.name(),
            prefix
        )),
        _ => Ok(id),
    }
}

/// Collect ids from arguments, reading stdin when the only argument is `-`
pub fn collect_ids(args: &[String]) -> Result<Vec<String>> {
    if args.len() == 1 && args[0] == "-" {
        return read_ids_from_stdin().ok_or_else(|| miette!("No IDs on stdin"));
    }
    Ok(args.to_vec())
}

/// Read entity IDs from stdin if it is piped
///
/// Enables pipelines like:
/// ```bash
/// idesk task list --status pending -f id | idesk submit -
/// ```
pub fn read_ids_from_stdin() -> Option<Vec<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return None;
    }

    let ids: Vec<String> = stdin
        .lock()
        .lines()
        .map_while(|line| line.ok())
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}

/// Status with terminal colour
pub fn styled_status(status: Status) -> String {
    let text = status.to_string();
    match status {
        Status::Pending | Status::PendingApproval => style(text).yellow().to_string(),
        Status::Submitted => style(text).cyan().to_string(),
        Status::Approved => style(text).green().to_string(),
        Status::Rejected => style(text).red().to_string(),
    }
}

/// Warn on stderr when an entity was dated outside an approved placement
pub fn warn_placement_check(check: PlacementCheck) {
    match check {
        PlacementCheck::Outside => eprintln!(
            "{} Date falls outside every approved placement window; flagged for review",
            style("!").yellow()
        ),
        PlacementCheck::NoApprovedPlacement => eprintln!(
            "{} No approved placement on record; flagged for review",
            style("!").yellow()
        ),
        PlacementCheck::Within | PlacementCheck::Unchecked => {}
    }
}

/// Print the review block shared by tasks, reports and placements
pub fn print_review_state(state: &ReviewState) {
    println!("{}: {}", style("Status").bold(), styled_status(state.status));

    if !state.reviewer_comments.is_empty() {
        println!();
        println!("{}", style("Reviewer comments:").bold());
        for (role, comment) in &state.reviewer_comments {
            println!("  • {}: {}", style(role).cyan(), comment);
        }
    }

    if !state.review_log.is_empty() {
        println!();
        println!("{}", style("Review history:").bold());
        for record in &state.review_log {
            println!(
                "  {} {} ({}) {}",
                style(record.timestamp.format("%Y-%m-%d %H:%M")).dim(),
                record.reviewer,
                record.role,
                record.decision
            );
        }
    }

    println!("{}", style("─".repeat(60)).dim());
    let submitted = state
        .submitted
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}: {} | {}: {} | {}: {}",
        style("Created").dim(),
        state.created.format("%Y-%m-%d %H:%M"),
        style("Submitted").dim(),
        submitted,
        style("Updated").dim(),
        state.updated.format("%Y-%m-%d %H:%M")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Task);
        let formatted = format_short_id(&id);
        // TASK- plus 26 ULID chars, so always truncated
        assert_eq!(formatted.len(), 16);
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("àéîõü and more", 6), "àéî...");
    }

    #[test]
    fn test_parse_id_checks_kind() {
        let id = EntityId::new(EntityPrefix::Rpt).to_string();
        assert!(parse_id(&id, Some(EntityPrefix::Rpt)).is_ok());
        assert!(parse_id(&id, Some(EntityPrefix::Task)).is_err());
        assert!(parse_id("nonsense", None).is_err());
    }

    #[test]
    fn test_collect_ids_passes_arguments_through() {
        let args = vec!["TASK-A".to_string(), "RPT-B".to_string()];
        assert_eq!(collect_ids(&args).unwrap(), args);
    }
}
