//! Pairing of consecutively numbered scans in a folder.
//!
//! A scanner without duplex support writes every pass as its own numbered
//! file: `scan_001.pdf` holds the fronts, `scan_002.pdf` the backs. The
//! grouper finds such neighbours and merges each pair into
//! `scan_001-002.pdf`.
//!
//! Files are grouped by family (the stem with its number removed) and sorted
//! by number. Walking the sorted list, a file whose successor carries the
//! next number forms a pair with it; otherwise it is reported as unpaired.
//! Outputs of earlier runs (stems ending in `<n>-<n+1>`) are never
//! candidates; they are reported as skipped.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::GroupOptions;
use crate::error::{DocMoverError, FailureKind, Result};
use crate::merge::{MergeJob, MergeReport, PageSource, PdfMerger};
use crate::utils::{NumberedStem, collect_pdfs_in, is_merged_range, pair_consecutive};

/// A pair found by [`ConsecutiveGrouper::scan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedPair {
    /// File with the lower number.
    pub primary: PathBuf,
    /// File with the next number.
    pub secondary: PathBuf,
    /// File name of the merged output.
    pub output_name: String,
}

/// Pairs and leftovers of a folder scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupPlan {
    /// Pairs to merge, in folder order.
    pub pairs: Vec<PlannedPair>,
    /// PDFs without a consecutive partner.
    pub unpaired: Vec<PathBuf>,
    /// PDFs whose name already ends in a consecutive range.
    pub merged_outputs: Vec<PathBuf>,
}

/// Why a file was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCause {
    /// No consecutively numbered partner.
    Unpaired,
    /// Name already ends in a consecutive range, like an earlier merge output.
    MergedRange,
}

/// Outcome for one pair or unpaired file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GroupOutcome {
    /// Pair merged.
    Merged {
        /// Merge details.
        report: MergeReport,
    },
    /// Pair would be merged (dry run).
    Planned {
        /// File with the lower number.
        primary: PathBuf,
        /// File with the next number.
        secondary: PathBuf,
        /// Output that would be written.
        output: PathBuf,
    },
    /// File left alone.
    Skipped {
        /// The file.
        path: PathBuf,
        /// Why.
        reason: SkipCause,
    },
    /// Pair could not be merged; both inputs are untouched.
    Failed {
        /// File with the lower number.
        primary: PathBuf,
        /// File with the next number.
        secondary: PathBuf,
        /// Failure classification.
        kind: FailureKind,
        /// Error description.
        message: String,
    },
}

/// Result of [`ConsecutiveGrouper::run`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupReport {
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// One entry per pair, then one per file left alone.
    pub outcomes: Vec<GroupOutcome>,
}

impl GroupReport {
    /// Number of pairs merged.
    pub fn merged(&self) -> usize {
        self.count(|o| matches!(o, GroupOutcome::Merged { .. }))
    }

    /// Number of pairs planned in a dry run.
    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, GroupOutcome::Planned { .. }))
    }

    /// Number of files left alone.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, GroupOutcome::Skipped { .. }))
    }

    /// Number of failed pairs.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, GroupOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&GroupOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}

/// Finds and merges consecutively numbered PDF pairs.
#[derive(Debug, Clone, Default)]
pub struct ConsecutiveGrouper {
    merger: PdfMerger,
}

impl ConsecutiveGrouper {
    /// Create a grouper with a default merger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find consecutive pairs in `folder` without touching anything.
    ///
    /// # Errors
    ///
    /// Returns an error if `folder` is not a readable directory.
    pub fn scan(&self, folder: &Path) -> Result<GroupPlan> {
        let mut families: BTreeMap<String, Vec<(u64, String, (PathBuf, String))>> =
            BTreeMap::new();
        let mut plan = GroupPlan::default();

        for path in collect_pdfs_in(folder)? {
            let (Some(stem), Some(name)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.file_name().and_then(|s| s.to_str()),
            ) else {
                plan.unpaired.push(path);
                continue;
            };

            if is_merged_range(stem) {
                plan.merged_outputs.push(path);
                continue;
            }

            let Some(numbered) = NumberedStem::parse(stem) else {
                plan.unpaired.push(path);
                continue;
            };

            let (number, family) = (numbered.number, numbered.family());
            let stem = stem.to_string();
            let name = name.to_string();
            families
                .entry(family)
                .or_default()
                .push((number, name, (path, stem)));
        }

        for members in families.into_values() {
            let (pairs, singles) = pair_consecutive(members);

            for ((primary, primary_stem), (secondary, secondary_stem)) in pairs {
                let output_name = match (
                    NumberedStem::parse(&primary_stem),
                    NumberedStem::parse(&secondary_stem),
                ) {
                    (Some(first), Some(second)) => {
                        format!("{}.pdf", first.with_range(&second, "-"))
                    }
                    _ => format!("{primary_stem}-{secondary_stem}.pdf"),
                };

                plan.pairs.push(PlannedPair {
                    primary,
                    secondary,
                    output_name,
                });
            }
            plan.unpaired.extend(singles.into_iter().map(|(path, _)| path));
        }

        plan.pairs.sort_by(|a, b| a.primary.cmp(&b.primary));
        plan.unpaired.sort();
        plan.merged_outputs.sort();
        Ok(plan)
    }

    /// Merge every consecutive pair in `folder` into `options.dest_folder`.
    ///
    /// A failing pair is reported and the remaining pairs still run. An
    /// existing output is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error only if `folder` cannot be scanned.
    pub async fn run(&self, folder: &Path, options: &GroupOptions) -> Result<GroupReport> {
        let plan = self.scan(folder)?;
        let mut report = GroupReport {
            dry_run: options.dry_run,
            outcomes: Vec::with_capacity(
                plan.pairs.len() + plan.unpaired.len() + plan.merged_outputs.len(),
            ),
        };

        for pair in plan.pairs {
            let output = options.dest_folder.join(&pair.output_name);
            let outcome = self.run_pair(pair, output, options).await;
            report.outcomes.push(outcome);
        }

        for path in plan.unpaired {
            tracing::debug!(path = %path.display(), "no consecutive partner");
            report.outcomes.push(GroupOutcome::Skipped {
                path,
                reason: SkipCause::Unpaired,
            });
        }

        for path in plan.merged_outputs {
            tracing::debug!(path = %path.display(), "ignoring merged output");
            report.outcomes.push(GroupOutcome::Skipped {
                path,
                reason: SkipCause::MergedRange,
            });
        }

        Ok(report)
    }

    async fn run_pair(&self, pair: PlannedPair, output: PathBuf, options: &GroupOptions) -> GroupOutcome {
        let failed = |pair: PlannedPair, err: DocMoverError| {
            tracing::error!(
                primary = %pair.primary.display(),
                secondary = %pair.secondary.display(),
                error = %err,
                "pair not merged"
            );
            GroupOutcome::Failed {
                primary: pair.primary,
                secondary: pair.secondary,
                kind: err.kind(),
                message: err.to_string(),
            }
        };

        if output.exists() {
            return failed(pair, DocMoverError::output_collision(&output));
        }

        if options.dry_run {
            tracing::info!(output = %output.display(), "would merge pair");
            return GroupOutcome::Planned {
                primary: pair.primary,
                secondary: pair.secondary,
                output,
            };
        }

        let job = match describe_pair(&pair, output, options) {
            Ok(job) => job,
            Err(err) => return failed(pair, err),
        };

        match self.merger.execute(job).await {
            Ok(report) => GroupOutcome::Merged { report },
            Err(err) => failed(pair, err),
        }
    }
}

fn describe_pair(pair: &PlannedPair, output: PathBuf, options: &GroupOptions) -> Result<MergeJob> {
    Ok(MergeJob::new(
        PageSource::from_path(&pair.primary)?,
        PageSource::from_path(&pair.secondary)?,
        output,
        options.merge,
    ))
}
