//! Matching of dual-sided scans.
//!
//! Dual-sided scans are files whose name starts with the configured prefix.
//! Two naming conventions are understood:
//!
//! - **Designated**: the stem carries a side token (`front`/`odd` or
//!   `back`/`even`) separated by `_`, `-`, `.` or a space. Removing the token
//!   gives the pairing key: `double-sided_front_A.pdf` and
//!   `double-sided_back_A.pdf` share the key `double-sided_A`.
//! - **Numbered**: no side token, but a trailing number. Files of the same
//!   family pair when their numbers are consecutive:
//!   `double-sided_1.pdf` and `double-sided_2.pdf` share the key
//!   `double-sided_1_2`.
//!
//! Each pair is merged into `<key>_merged.pdf` with the front side (or the
//! lower number) as the primary document.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::config::MergeOptions;
use crate::error::{DocMoverError, Result};
use crate::merge::{MergeJob, MergeReport, PageSource, PdfMerger};
use crate::mover::FileCandidate;
use crate::utils::{NumberedStem, pair_consecutive};

/// Characters separating tokens in a file stem.
const SEPARATORS: [char; 4] = ['_', '-', '.', ' '];

/// Suffix appended to the pairing key to name the merged output.
pub const MERGED_SUFFIX: &str = "_merged.pdf";

/// Which pass of a dual-sided scan a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Side {
    /// Front pages (`front`, `odd`); the primary document of a merge.
    Front,
    /// Back pages (`back`, `even`).
    Back,
}

impl Side {
    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "front" | "odd" => Some(Self::Front),
            "back" | "even" => Some(Self::Back),
            _ => None,
        }
    }
}

/// Find the side token in `stem` and return the side with the pairing key.
///
/// The last side token wins. The token is removed together with the
/// separator before it (or after it, when the token starts the stem).
///
/// # Examples
///
/// ```
/// use docmover::mover::pairing::{Side, side_designator};
///
/// let (side, key) = side_designator("double-sided_back_A").unwrap();
/// assert_eq!(side, Side::Back);
/// assert_eq!(key, "double-sided_A");
/// assert!(side_designator("double-sided_3").is_none());
/// ```
pub fn side_designator(stem: &str) -> Option<(Side, String)> {
    let (side, token) = token_spans(stem)
        .into_iter()
        .rev()
        .find_map(|span| Side::from_token(&stem[span.clone()]).map(|side| (side, span)))?;

    // Separators are ASCII, so neighbouring byte offsets are char boundaries.
    let cut = if token.start > 0 {
        token.start - 1..token.end
    } else if token.end < stem.len() {
        0..token.end + 1
    } else {
        token
    };

    Some((side, format!("{}{}", &stem[..cut.start], &stem[cut.end..])))
}

fn token_spans(stem: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, c) in stem.char_indices() {
        if SEPARATORS.contains(&c) {
            if i > start {
                spans.push(start..i);
            }
            start = i + c.len_utf8();
        }
    }
    if start < stem.len() {
        spans.push(start..stem.len());
    }
    spans
}

/// Two files forming one dual-sided document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualSidePair {
    /// Pairing key; names the merged output.
    pub key: String,
    /// Front side or lower number.
    pub primary: FileCandidate,
    /// Back side or higher number.
    pub secondary: FileCandidate,
}

impl DualSidePair {
    /// Output path of this pair's merge inside `output_dir`.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}{MERGED_SUFFIX}", self.key))
    }
}

/// Pairs found among candidates, plus files still waiting for a partner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingPlan {
    /// Complete pairs, ordered by key.
    pub pairs: Vec<DualSidePair>,
    /// Candidates without a partner in this run.
    pub pending: Vec<FileCandidate>,
}

/// What happened to one pair.
#[derive(Debug)]
pub enum PairResult {
    /// Merged into the output; both inputs deleted.
    Merged(MergeReport),
    /// Would be merged (dry run).
    Planned,
    /// Merge failed; both inputs untouched.
    Failed(DocMoverError),
}

/// Outcome for one pair, keyed by pairing key in [`PairingResult`].
#[derive(Debug)]
pub struct PairOutcome {
    /// Primary input.
    pub primary: PathBuf,
    /// Secondary input.
    pub secondary: PathBuf,
    /// Merged output path (written only on success).
    pub output: PathBuf,
    /// Result of the merge.
    pub result: PairResult,
}

/// Result of [`DualSidePairer::pair_and_merge`].
#[derive(Debug, Default)]
pub struct PairingResult {
    /// One outcome per pair.
    pub outcomes: BTreeMap<String, PairOutcome>,
    /// Candidates without a partner.
    pub pending: Vec<FileCandidate>,
}

/// Matches dual-sided scans and merges each pair.
#[derive(Debug, Clone)]
pub struct DualSidePairer {
    prefix: String,
    options: MergeOptions,
    merger: PdfMerger,
}

impl DualSidePairer {
    /// Create a pairer for files starting with `prefix`.
    ///
    /// Merges always delete their inputs after a successful write.
    pub fn new(prefix: impl Into<String>, remove_empty_pages: bool, reverse_secondary: bool) -> Self {
        Self {
            prefix: prefix.into(),
            options: MergeOptions {
                delete_source: true,
                remove_empty_pages,
                reverse_secondary,
            },
            merger: PdfMerger::new(),
        }
    }

    /// Whether the file name carries the dual-side prefix.
    pub fn is_dual_side(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with(&self.prefix))
    }

    /// Whether the file can take part in a merge: prefixed and a PDF.
    pub fn is_candidate(&self, path: &Path) -> bool {
        self.is_dual_side(path)
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }

    /// Group candidates into pairs.
    ///
    /// Where naming is ambiguous (several fronts or backs for one key), the
    /// lexicographically first file of each side is paired and the rest
    /// stay pending.
    pub fn plan(&self, mut candidates: Vec<FileCandidate>) -> PairingPlan {
        candidates.sort_by(|a, b| a.name.cmp(&b.name));

        let mut designated: BTreeMap<String, (Vec<FileCandidate>, Vec<FileCandidate>)> =
            BTreeMap::new();
        let mut numbered: BTreeMap<String, Vec<(u64, String, FileCandidate)>> = BTreeMap::new();
        let mut plan = PairingPlan::default();

        for candidate in candidates {
            let Some(stem) = candidate.stem().map(str::to_string) else {
                plan.pending.push(candidate);
                continue;
            };

            if let Some((side, key)) = side_designator(&stem) {
                let sides = designated.entry(key).or_default();
                match side {
                    Side::Front => sides.0.push(candidate),
                    Side::Back => sides.1.push(candidate),
                }
            } else if let Some(number) = NumberedStem::parse(&stem) {
                numbered
                    .entry(number.family())
                    .or_default()
                    .push((number.number, candidate.name.clone(), candidate));
            } else {
                plan.pending.push(candidate);
            }
        }

        for (key, (fronts, backs)) in designated {
            let mut fronts = fronts.into_iter();
            let mut backs = backs.into_iter();
            match (fronts.next(), backs.next()) {
                (Some(primary), Some(secondary)) => plan.pairs.push(DualSidePair {
                    key,
                    primary,
                    secondary,
                }),
                (front, back) => plan.pending.extend(front.into_iter().chain(back)),
            }
            plan.pending.extend(fronts.chain(backs));
        }

        for members in numbered.into_values() {
            let (pairs, singles) = pair_consecutive(members);
            for (primary, secondary) in pairs {
                let key = match (
                    primary.stem().and_then(NumberedStem::parse),
                    secondary.stem().and_then(NumberedStem::parse),
                ) {
                    (Some(first), Some(second)) => Some(first.with_range(&second, "_")),
                    _ => None,
                };
                match key {
                    Some(key) => plan.pairs.push(DualSidePair {
                        key,
                        primary,
                        secondary,
                    }),
                    None => plan.pending.extend([primary, secondary]),
                }
            }
            plan.pending.extend(singles);
        }

        // Keys name outputs; a duplicate would overwrite another pair's merge.
        plan.pairs.sort_by(|a, b| a.key.cmp(&b.key));
        let mut unique: Vec<DualSidePair> = Vec::with_capacity(plan.pairs.len());
        for pair in plan.pairs {
            if unique.last().is_some_and(|last| last.key == pair.key) {
                plan.pending.push(pair.primary);
                plan.pending.push(pair.secondary);
            } else {
                unique.push(pair);
            }
        }
        plan.pairs = unique;

        plan.pending.sort_by(|a, b| a.name.cmp(&b.name));
        plan
    }

    /// Paths of `pending` files that would pair with one of `others`.
    ///
    /// `others` are dual-sided files present in the source directory but
    /// not ready to merge (still being written, or empty). A pending file
    /// with such a partner must keep waiting instead of being moved alone.
    pub fn with_present_partner(
        &self,
        pending: &[FileCandidate],
        others: &[FileCandidate],
    ) -> BTreeSet<PathBuf> {
        if pending.is_empty() || others.is_empty() {
            return BTreeSet::new();
        }

        let waiting: BTreeSet<&Path> = pending.iter().map(|c| c.path.as_path()).collect();
        self.plan(pending.iter().chain(others).cloned().collect())
            .pairs
            .into_iter()
            .flat_map(|pair| [pair.primary.path, pair.secondary.path])
            .filter(|path| waiting.contains(path.as_path()))
            .collect()
    }

    /// Pair `candidates` and merge every complete pair into `output_dir`.
    ///
    /// An existing output fails that pair without touching its inputs,
    /// also under `dry_run`. Otherwise a dry run reports every pair as
    /// planned and nothing is written or deleted.
    pub async fn pair_and_merge(
        &self,
        candidates: Vec<FileCandidate>,
        output_dir: &Path,
        dry_run: bool,
    ) -> PairingResult {
        let plan = self.plan(candidates);
        let mut result = PairingResult {
            outcomes: BTreeMap::new(),
            pending: plan.pending,
        };

        for pair in plan.pairs {
            let output = pair.output_path(output_dir);
            let merge_result = if dry_run && output.exists() {
                tracing::warn!(key = %pair.key, output = %output.display(), "merge output already exists");
                PairResult::Failed(DocMoverError::output_collision(&output))
            } else if dry_run {
                tracing::info!(key = %pair.key, output = %output.display(), "would merge dual-side pair");
                PairResult::Planned
            } else {
                match self.merge_pair(&pair, &output).await {
                    Ok(report) => PairResult::Merged(report),
                    Err(err) => {
                        tracing::error!(key = %pair.key, error = %err, "dual-side merge failed");
                        PairResult::Failed(err)
                    }
                }
            };

            result.outcomes.insert(
                pair.key,
                PairOutcome {
                    primary: pair.primary.path,
                    secondary: pair.secondary.path,
                    output,
                    result: merge_result,
                },
            );
        }

        result
    }

    async fn merge_pair(&self, pair: &DualSidePair, output: &Path) -> Result<MergeReport> {
        if output.exists() {
            return Err(DocMoverError::output_collision(output));
        }

        let job = MergeJob::new(
            PageSource::from_path(&pair.primary.path)?,
            PageSource::from_path(&pair.secondary.path)?,
            output,
            self.options,
        );
        self.merger.execute(job).await
    }
}
