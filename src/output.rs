//! CLI output formatting for the run summary.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each section leads
//! with the semantic outcome of a pipeline phase — how many records landed,
//! what changed, what was delivered — with counts inline rather than file
//! listings. Structured logs carry the per-item detail; the summary is what
//! a human reads after a run.
//!
//! # Output Format
//!
//! ```text
//! Photos
//!     212 records ingested, 2 skipped
//!
//! Tree
//!     418 entries (96 keyword, 14 event)
//!
//! Changes (version 7)
//!     5 new, 2 updated, 1 deleted, 410 unchanged
//!     8 queued
//!
//! Delivery
//!     8 delivered, 0 failed, 0 remaining
//! ```
//!
//! A no-op run collapses to:
//!
//! ```text
//! Photos
//!     212 records ingested
//!
//! No changes since last run (version 7)
//! ```
//!
//! # Architecture
//!
//! `format_*` functions return `Vec<String>` for testability and `print_*`
//! wrappers write to stdout. Format functions are pure — no I/O, no side
//! effects.

use crate::pipeline::RunReport;
use crate::queue::DrainStats;

/// Pluralize-free count phrase: `"2 skipped"` only when nonzero.
fn count_suffix(count: usize, label: &str) -> Option<String> {
    (count > 0).then(|| format!("{count} {label}"))
}

/// Format the full run summary.
pub fn format_run_report(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Photos".to_string());
    let mut ingested = format!("    {} records ingested", report.photos - report.skipped);
    if let Some(skipped) = count_suffix(report.skipped, "skipped") {
        ingested.push_str(&format!(", {skipped}"));
    }
    lines.push(ingested);

    if report.no_op {
        lines.push(String::new());
        lines.push(format!(
            "No changes since last run (version {})",
            report.version
        ));
        return lines;
    }

    lines.push(String::new());
    lines.push("Tree".to_string());
    lines.push(format!(
        "    {} entries ({} keyword, {} event)",
        report.tree_entries, report.keyword_entries, report.event_entries
    ));

    lines.push(String::new());
    lines.push(format!("Changes (version {})", report.version));
    lines.push(format!(
        "    {} new, {} updated, {} deleted, {} unchanged",
        report.new_items, report.updated_items, report.deleted_items, report.unchanged_items
    ));
    lines.push(format!("    {} queued", report.queued));

    if let Some(ref drain) = report.drain {
        lines.push(String::new());
        lines.push("Delivery".to_string());
        lines.push(format!("    {}", format_drain_stats(drain)));
    }

    lines
}

fn format_drain_stats(stats: &DrainStats) -> String {
    let mut line = format!(
        "{} delivered, {} failed, {} remaining",
        stats.delivered, stats.failed, stats.remaining
    );
    if stats.quota_reached {
        line.push_str(" (quota reached)");
    }
    line
}

/// Print the run summary to stdout.
pub fn print_run_report(report: &RunReport) {
    for line in format_run_report(report) {
        println!("{}", line);
    }
}

/// Format a standalone drain summary (the `drain` subcommand).
pub fn format_drain_report(stats: &DrainStats) -> Vec<String> {
    vec!["Delivery".to_string(), format!("    {}", format_drain_stats(stats))]
}

/// Print a standalone drain summary to stdout.
pub fn print_drain_report(stats: &DrainStats) {
    for line in format_drain_report(stats) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
