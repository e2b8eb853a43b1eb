//! Moving finished scans out of the staging directory.
//!
//! One [`DocumentMover::run`] walks every file in the source directory
//! through the same sequence of decisions:
//!
//! 1. Younger than the stability wait: deferred to a later run.
//! 2. Size or mtime changed during the wait: unstable, left alone.
//! 3. Empty: a scanner placeholder, left alone.
//! 4. Dual-sided PDF: paired and merged into the work directory, or held
//!    back until its partner arrives (or until it is older than the
//!    maximum age, when it is moved on its own).
//! 5. Everything else: relocated to the destination directory.
//!
//! Merged documents, including ones left in the work directory by an
//! earlier run, are relocated to the dual-side destination. Runs keep no
//! state between invocations; every decision is recomputed from the
//! filesystem.
//!
//! # Examples
//!
//! ```no_run
//! use docmover::MoverConfig;
//! use docmover::mover::DocumentMover;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = MoverConfig::new("/srv/scans/incoming", "/srv/scans/archive");
//! config.dual_dest_dir = Some("/srv/scans/duplex".into());
//! config.stability_wait = Duration::from_secs(5);
//!
//! let report = DocumentMover::new(config).run().await?;
//! for outcome in &report.outcomes {
//!     println!("{}: {:?}", outcome.subject.display(), outcome.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod fs;
pub mod lock;
pub mod pairing;
pub mod relocate;
pub mod stability;


pub use fs::{FileStat, FileSystem, LocalFileSystem};
pub use lock::RunLock;
pub use pairing::{DualSidePairer, PairResult, Side};
pub use relocate::{Relocation, Relocator};
pub use stability::{StabilityChecker, StabilityRecord};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

use crate::config::MoverConfig;
use crate::error::{DocMoverError, FailureKind, Result};
use crate::utils::collect_pdfs_in;

/// A file found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Location in the source directory.
    pub path: PathBuf,
    /// File name (lossy UTF-8).
    pub name: String,
    /// Size in bytes at discovery.
    pub size: u64,
    /// Modification time at discovery.
    pub mtime: Option<SystemTime>,
    /// Time since the last modification.
    pub age: Duration,
}

impl FileCandidate {
    /// Describe a file.
    pub fn new(path: PathBuf, size: u64, mtime: Option<SystemTime>, age: Duration) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            size,
            mtime,
            age,
        }
    }

    /// Describe a file from a metadata snapshot taken at `now`.
    pub fn from_stat(path: PathBuf, stat: FileStat, now: SystemTime) -> Self {
        let age = match stat.mtime {
            Some(mtime) => now.duration_since(mtime).unwrap_or_default(),
            None => Duration::MAX,
        };
        Self::new(path, stat.size, stat.mtime, age)
    }

    /// File name without its extension.
    pub fn stem(&self) -> Option<&str> {
        Path::new(self.name.as_str())
            .file_stem()
            .and_then(|s| s.to_str())
    }
}

/// Why a file was left in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Modified more recently than the stability wait.
    Deferred,
    /// Changed during the stability wait, or disappeared.
    Unstable,
    /// Zero bytes.
    EmptyFile,
    /// Dual-sided scan waiting for its partner.
    PairingPending,
}

/// Final state of one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoveStatus {
    /// Relocated (or, in a dry run, would be relocated) to `destination`.
    Moved {
        /// Final path.
        destination: PathBuf,
        /// Ownership or permission changes that failed after the move.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    /// Left in place for now.
    Skipped {
        /// Why.
        reason: SkipReason,
    },
    /// Could not be processed; sources are untouched.
    Failed {
        /// Failure classification.
        kind: FailureKind,
        /// Error description.
        message: String,
    },
}

/// Outcome for one file or merged pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    /// The file acted upon: a source file or a merged output.
    pub subject: PathBuf,
    /// Source files that produced the subject (the pair, for a merge).
    pub sources: Vec<PathBuf>,
    /// What happened.
    #[serde(flatten)]
    pub status: MoveStatus,
}

impl MoveOutcome {
    fn single(path: PathBuf, status: MoveStatus) -> Self {
        Self {
            sources: vec![path.clone()],
            subject: path,
            status,
        }
    }

    fn skipped(path: PathBuf, reason: SkipReason) -> Self {
        Self::single(path, MoveStatus::Skipped { reason })
    }

    fn failed(subject: PathBuf, sources: Vec<PathBuf>, err: &DocMoverError) -> Self {
        Self {
            subject,
            sources,
            status: MoveStatus::Failed {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

/// Result of a mover run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MoveReport {
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// One entry per subject, in processing order.
    pub outcomes: Vec<MoveOutcome>,
}

impl MoveReport {
    /// Subjects relocated (or planned, in a dry run).
    pub fn moved(&self) -> usize {
        self.count(|s| matches!(s, MoveStatus::Moved { .. }))
    }

    /// Subjects left in place.
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, MoveStatus::Skipped { .. }))
    }

    /// Subjects that failed.
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, MoveStatus::Failed { .. }))
    }

    /// Outcome for a subject, if any.
    pub fn outcome_for(&self, subject: &Path) -> Option<&MoveOutcome> {
        self.outcomes.iter().find(|o| o.subject == subject)
    }

    fn count(&self, predicate: impl Fn(&MoveStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

/// Orchestrates stability checks, dual-side pairing and relocation.
#[derive(Debug)]
pub struct DocumentMover {
    config: MoverConfig,
    fs: Arc<dyn FileSystem>,
    stability: StabilityChecker,
    pairer: DualSidePairer,
    relocator: Relocator,
}

impl DocumentMover {
    /// Create a mover operating on the local filesystem.
    pub fn new(config: MoverConfig) -> Self {
        Self::with_file_system(config, Arc::new(LocalFileSystem))
    }

    /// Create a mover whose filesystem primitives go through `fs`.
    pub fn with_file_system(config: MoverConfig, fs: Arc<dyn FileSystem>) -> Self {
        let pairer = DualSidePairer::new(
            config.dual_side_prefix.clone(),
            config.remove_empty_pages,
            config.reverse_back_side,
        );
        let relocator = Relocator::new(
            Arc::clone(&fs),
            config.user_id,
            config.group_id,
            config.file_mode,
            config.dry_run,
        );
        Self {
            stability: StabilityChecker::new(Arc::clone(&fs)),
            config,
            fs,
            pairer,
            relocator,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &MoverConfig {
        &self.config
    }

    /// Process the source directory once.
    ///
    /// Per-file problems are recorded in the report and never abort the
    /// run.
    ///
    /// # Errors
    ///
    /// Returns [`DocMoverError::InvalidConfig`] if the configuration is
    /// invalid or a configured directory does not exist.
    pub async fn run(&self) -> Result<MoveReport> {
        self.check_directories()?;

        let mut report = MoveReport {
            dry_run: self.config.dry_run,
            outcomes: Vec::new(),
        };

        if self.config.dry_run {
            tracing::info!("dry run: nothing will be changed");
        }

        self.relocate_leftovers(&mut report);

        let candidates = self.discover();
        tracing::info!(count = candidates.len(), source = %self.config.source_dir.display(), "found files");

        let (settled, deferred): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| c.age >= self.config.stability_wait);
        // Dual-sided files that exist but cannot be merged yet.
        let mut held: Vec<FileCandidate> = Vec::new();
        for candidate in deferred {
            tracing::debug!(path = %candidate.path.display(), "modified too recently");
            if self.pairer.is_candidate(&candidate.path) {
                held.push(candidate.clone());
            }
            report
                .outcomes
                .push(MoveOutcome::skipped(candidate.path, SkipReason::Deferred));
        }

        let ready = self.filter_stable(settled, &mut held, &mut report).await;

        let (dual, regular): (Vec<_>, Vec<_>) = ready
            .into_iter()
            .partition(|c| self.pairer.is_candidate(&c.path));

        self.process_dual_side(dual, &held, &mut report).await;

        for candidate in regular {
            let outcome = self.relocate_single(candidate.path, &self.config.dest_dir);
            report.outcomes.push(outcome);
        }

        tracing::info!(
            moved = report.moved(),
            skipped = report.skipped(),
            failed = report.failed(),
            "run complete"
        );
        Ok(report)
    }

    fn check_directories(&self) -> Result<()> {
        self.config.validate()?;

        let mut required = vec![
            ("Source", self.config.source_dir.as_path()),
            ("Destination", self.config.dest_dir.as_path()),
        ];
        if let Some(dual) = &self.config.dual_dest_dir {
            required.push(("Dual-side destination", dual.as_path()));
        }

        for (label, dir) in required {
            if !dir.is_dir() {
                return Err(DocMoverError::invalid_config(format!(
                    "{label} directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        Ok(())
    }

    /// Merged outputs are written atomically, so any PDF in the work
    /// directory is complete and ready to go.
    fn relocate_leftovers(&self, report: &mut MoveReport) {
        let work_dir = self.config.work_dir();
        if !work_dir.is_dir() {
            return;
        }

        match collect_pdfs_in(&work_dir) {
            Ok(leftovers) => {
                for path in leftovers {
                    tracing::info!(path = %path.display(), "relocating merged document from earlier run");
                    let outcome = self.relocate_single(path, self.config.dual_dest_dir());
                    report.outcomes.push(outcome);
                }
            }
            Err(err) => tracing::warn!(error = %err, "cannot list work directory"),
        }
    }

    fn discover(&self) -> Vec<FileCandidate> {
        let now = SystemTime::now();
        let mut candidates = Vec::new();

        let walker = WalkDir::new(&self.config.source_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "cannot read source entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.config.accepts_extension(entry.path()) {
                continue;
            }

            let path = entry.into_path();
            match self.fs.stat(&path) {
                Ok(stat) => candidates.push(FileCandidate::from_stat(path, stat, now)),
                // Vanished between listing and stat
                Err(err) => tracing::debug!(path = %path.display(), error = %err, "cannot stat"),
            }
        }

        candidates
    }

    async fn filter_stable(
        &self,
        candidates: Vec<FileCandidate>,
        held: &mut Vec<FileCandidate>,
        report: &mut MoveReport,
    ) -> Vec<FileCandidate> {
        if candidates.is_empty() {
            return candidates;
        }

        let paths: Vec<PathBuf> = candidates.iter().map(|c| c.path.clone()).collect();
        tracing::info!(
            count = paths.len(),
            wait = ?self.config.stability_wait,
            "checking file stability"
        );
        let records = self
            .stability
            .check_all(&paths, self.config.stability_wait)
            .await;

        let mut ready = Vec::with_capacity(candidates.len());
        for (mut candidate, record) in candidates.into_iter().zip(records) {
            if !record.is_stable() {
                if self.pairer.is_candidate(&candidate.path) {
                    held.push(candidate.clone());
                }
                report
                    .outcomes
                    .push(MoveOutcome::skipped(candidate.path, SkipReason::Unstable));
                continue;
            }

            candidate.size = record.size().unwrap_or(candidate.size);
            if candidate.size == 0 {
                tracing::debug!(path = %candidate.path.display(), "empty file");
                if self.pairer.is_candidate(&candidate.path) {
                    held.push(candidate.clone());
                }
                report
                    .outcomes
                    .push(MoveOutcome::skipped(candidate.path, SkipReason::EmptyFile));
                continue;
            }

            ready.push(candidate);
        }
        ready
    }

    async fn process_dual_side(
        &self,
        candidates: Vec<FileCandidate>,
        held: &[FileCandidate],
        report: &mut MoveReport,
    ) {
        if candidates.is_empty() {
            return;
        }

        let work_dir = self.config.work_dir();
        let paired = self
            .pairer
            .pair_and_merge(candidates, &work_dir, self.config.dry_run)
            .await;

        for (key, outcome) in paired.outcomes {
            let sources = vec![outcome.primary, outcome.secondary];
            let entry = match outcome.result {
                PairResult::Merged(_) | PairResult::Planned => {
                    match self
                        .relocator
                        .relocate(&outcome.output, self.config.dual_dest_dir())
                    {
                        Ok(relocation) => MoveOutcome {
                            subject: outcome.output,
                            sources,
                            status: MoveStatus::Moved {
                                destination: relocation.destination,
                                warnings: relocation.warnings,
                            },
                        },
                        Err(err) => {
                            // The merge stays in the work dir for the next run.
                            tracing::error!(key = %key, error = %err, "merged document not relocated");
                            MoveOutcome::failed(outcome.output, sources, &err)
                        }
                    }
                }
                PairResult::Failed(err) => MoveOutcome::failed(outcome.output, sources, &err),
            };
            report.outcomes.push(entry);
        }

        let partnered = self.pairer.with_present_partner(&paired.pending, held);
        for candidate in paired.pending {
            if partnered.contains(&candidate.path) {
                tracing::debug!(
                    path = %candidate.path.display(),
                    "dual-side partner present but not ready"
                );
                report.outcomes.push(MoveOutcome::skipped(
                    candidate.path,
                    SkipReason::PairingPending,
                ));
            } else if candidate.age > self.config.max_age {
                tracing::warn!(
                    path = %candidate.path.display(),
                    age = ?candidate.age,
                    "no dual-side partner within the maximum age, moving alone"
                );
                let outcome = self.relocate_single(candidate.path, &self.config.dest_dir);
                report.outcomes.push(outcome);
            } else {
                tracing::debug!(path = %candidate.path.display(), "waiting for dual-side partner");
                report.outcomes.push(MoveOutcome::skipped(
                    candidate.path,
                    SkipReason::PairingPending,
                ));
            }
        }
    }

    fn relocate_single(&self, path: PathBuf, dest_dir: &Path) -> MoveOutcome {
        match self.relocator.relocate(&path, dest_dir) {
            Ok(relocation) => MoveOutcome::single(
                path,
                MoveStatus::Moved {
                    destination: relocation.destination,
                    warnings: relocation.warnings,
                },
            ),
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, code = ?err.os_code(), "not moved");
                MoveOutcome::failed(path.clone(), vec![path], &err)
            }
        }
    }
}
