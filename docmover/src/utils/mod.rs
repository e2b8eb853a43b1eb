//! Utilities for path collection and scan file naming.

use regex::Regex;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{DocMoverError, Result};

/// Last maximal run of digits in a stem, followed by non-digits only.
static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\D*$").expect("trailing number pattern is valid"));

/// A `<digits>-<digits>` range at the end of a stem, as written by the grouper.
static MERGED_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)-(\d+)\D*$").expect("merged range pattern is valid"));

/// Collect the PDF files directly inside `folder`.
///
/// The extension match is case-insensitive. Results are sorted by path.
///
/// Errors:
/// - `InvalidConfig` if `folder` is not a directory or not valid UTF-8.
/// - Propagates filesystem errors from the glob iterator.
pub fn collect_pdfs_in(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(DocMoverError::invalid_config(format!(
            "Not a directory: {}",
            folder.display()
        )));
    }

    let folder_str = folder.to_str().ok_or_else(|| {
        DocMoverError::invalid_config(format!("Path is not valid UTF-8: {}", folder.display()))
    })?;
    let pattern = format!("{}/*.pdf", glob::Pattern::escape(folder_str));

    let options = glob::MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let paths = glob::glob_with(&pattern, options).map_err(|err| DocMoverError::Other {
        message: err.to_string(),
    })?;

    let mut resolved_paths = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| DocMoverError::os("list", err.path().to_path_buf(), err.into_error()))?;
        if path.is_file() {
            resolved_paths.push(path);
        }
    }

    resolved_paths.sort();
    Ok(resolved_paths)
}

/// A file stem split around its trailing number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedStem<'a> {
    stem: &'a str,
    digits: Range<usize>,
    /// Value of the trailing number.
    pub number: u64,
}

impl<'a> NumberedStem<'a> {
    /// Split `stem` around its last run of digits.
    ///
    /// Returns `None` when the stem has no digits or the number overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use docmover::utils::NumberedStem;
    ///
    /// let numbered = NumberedStem::parse("scan_007").unwrap();
    /// assert_eq!(numbered.number, 7);
    /// assert_eq!(numbered.digits(), "007");
    /// assert_eq!(numbered.family(), "scan_");
    /// ```
    pub fn parse(stem: &'a str) -> Option<Self> {
        let digits = TRAILING_NUMBER.captures(stem)?.get(1)?.range();
        let number = stem[digits.clone()].parse().ok()?;
        Some(Self {
            stem,
            digits,
            number,
        })
    }

    /// The number as written, including leading zeros.
    pub fn digits(&self) -> &'a str {
        &self.stem[self.digits.clone()]
    }

    /// The stem with its number removed; files sharing a family belong to
    /// the same numbering sequence.
    pub fn family(&self) -> String {
        format!(
            "{}{}",
            &self.stem[..self.digits.start],
            &self.stem[self.digits.end..]
        )
    }

    /// The stem with its number replaced by `<own><separator><other>`.
    pub fn with_range(&self, other: &NumberedStem<'_>, separator: &str) -> String {
        format!(
            "{}{}{}{}{}",
            &self.stem[..self.digits.start],
            self.digits(),
            separator,
            other.digits(),
            &self.stem[self.digits.end..]
        )
    }
}

/// Check whether a stem ends in a consecutive `<n>-<n+1>` range, the naming
/// used for merged pairs.
pub fn is_merged_range(stem: &str) -> bool {
    let Some(caps) = MERGED_RANGE.captures(stem) else {
        return false;
    };
    let first = caps[1].parse::<u64>();
    let second = caps[2].parse::<u64>();
    matches!((first, second), (Ok(a), Ok(b)) if a.checked_add(1) == Some(b))
}

/// Pair items with consecutive numbers.
///
/// Items are sorted by `(number, name)` and walked in order: an item whose
/// successor carries the next number forms a pair with it and both are
/// consumed; otherwise the item stays single. Returns the pairs in order
/// (lower number first) and the leftover singles.
pub fn pair_consecutive<T>(mut items: Vec<(u64, String, T)>) -> (Vec<(T, T)>, Vec<T>) {
    items.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

    let mut pairs = Vec::new();
    let mut singles = Vec::new();
    let mut iter = items.into_iter().peekable();

    while let Some((number, _, item)) = iter.next() {
        let next_is_consecutive = iter
            .peek()
            .is_some_and(|(next, _, _)| number.checked_add(1) == Some(*next));

        if next_is_consecutive && let Some((_, _, partner)) = iter.next() {
            pairs.push((item, partner));
        } else {
            singles.push(item);
        }
    }

    (pairs, singles)
}
