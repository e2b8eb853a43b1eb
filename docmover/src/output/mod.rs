//! Human-readable reporting for merge, group and move runs.
//!
//! Every report type also serializes with serde; the CLI prints JSON when
//! asked and uses these functions otherwise.
//!
//! # Examples
//!
//! ```no_run
//! use docmover::mover::DocumentMover;
//! use docmover::output::{OutputFormatter, display_move_report};
//! use docmover::MoverConfig;
//!
//! # async fn example(config: MoverConfig) -> docmover::Result<()> {
//! let report = DocumentMover::new(config).run().await?;
//! display_move_report(&OutputFormatter::default(), &report);
//! # Ok(())
//! # }
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::merge::{GroupOutcome, GroupReport, MergeReport, SkipCause};
use crate::mover::{MoveReport, MoveStatus, SkipReason};

/// One-line summary of a move run.
pub fn move_summary(report: &MoveReport) -> String {
    let verb = if report.dry_run { "Would move" } else { "Moved" };
    format!(
        "{verb} {} file(s), skipped {}, failed {}",
        report.moved(),
        report.skipped(),
        report.failed()
    )
}

/// One-line summary of a grouping run.
pub fn group_summary(report: &GroupReport) -> String {
    if report.dry_run {
        format!(
            "Would merge {} pair(s), skipped {}",
            report.planned(),
            report.skipped()
        )
    } else {
        format!(
            "Merged {} pair(s), skipped {}, failed {}",
            report.merged(),
            report.skipped(),
            report.failed()
        )
    }
}

fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Deferred => "modified too recently",
        SkipReason::Unstable => "still changing",
        SkipReason::EmptyFile => "empty file",
        SkipReason::PairingPending => "waiting for other side",
    }
}

/// Display a single merge result.
pub fn display_merge_report(formatter: &OutputFormatter, report: &MergeReport) {
    formatter.success(&format!(
        "Wrote {} ({} pages, {})",
        report.output.display(),
        report.pages_written,
        report.format_output_size()
    ));
    formatter.detail("Primary", &format!("{} ({} pages)", report.primary.display(), report.primary_pages));
    formatter.detail(
        "Secondary",
        &format!("{} ({} pages)", report.secondary.display(), report.secondary_pages),
    );
    if report.pages_removed > 0 {
        formatter.info(&format!("Removed {} blank page(s)", report.pages_removed));
    }
    formatter.detail("Time", &format!("{:.2}s", report.merge_time.as_secs_f64()));
    for warning in &report.deletion_warnings {
        formatter.warning(warning);
    }
}

/// Display the outcome of a grouping run.
pub fn display_group_report(formatter: &OutputFormatter, report: &GroupReport) {
    for outcome in &report.outcomes {
        match outcome {
            GroupOutcome::Merged { report } => display_merge_report(formatter, report),
            GroupOutcome::Planned {
                primary,
                secondary,
                output,
            } => formatter.info(&format!(
                "Would merge {} + {} -> {}",
                primary.display(),
                secondary.display(),
                output.display()
            )),
            GroupOutcome::Skipped { path, reason } => {
                let message = match reason {
                    SkipCause::Unpaired => "No partner for",
                    SkipCause::MergedRange => "Already merged:",
                };
                formatter.debug(&format!("{message} {}", path.display()));
            }
            GroupOutcome::Failed {
                primary,
                secondary,
                message,
                ..
            } => formatter.error(&format!(
                "{} + {}: {message}",
                primary.display(),
                secondary.display()
            )),
        }
    }

    formatter.section(&group_summary(report));
}

/// Display the outcome of a move run.
pub fn display_move_report(formatter: &OutputFormatter, report: &MoveReport) {
    for outcome in &report.outcomes {
        let subject = outcome.subject.display();
        match &outcome.status {
            MoveStatus::Moved {
                destination,
                warnings,
            } => {
                let verb = if report.dry_run { "Would move" } else { "Moved" };
                formatter.success(&format!("{verb} {subject} -> {}", destination.display()));
                if outcome.sources.len() > 1 {
                    for source in &outcome.sources {
                        formatter.detail("Merged from", &source.display().to_string());
                    }
                }
                for warning in warnings {
                    formatter.warning(warning);
                }
            }
            MoveStatus::Skipped { reason } => {
                formatter.debug(&format!("Skipped {subject}: {}", skip_label(*reason)));
            }
            MoveStatus::Failed { message, .. } => {
                formatter.error(&format!("{subject}: {message}"));
            }
        }
    }

    formatter.section(&move_summary(report));
}
