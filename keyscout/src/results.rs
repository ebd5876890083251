/// Result types that flow through a scan.
///
/// Ownership follows the pipeline: the distributor owns each [`FileTask`]
/// until it is received by exactly one worker, the worker produces a
/// [`PartialResult`] and moves it into the result channel, and the
/// aggregator consumes every partial to build the final [`AggregateResult`].
/// Nothing is shared mutably between stages.
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::keywords::KeywordSet;

/// A single file to scan, tagged with its position in the directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    index: usize,
    path: PathBuf,
}

impl FileTask {
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }

    /// Builds tasks for `paths`, numbering them in the given order
    pub fn from_paths<I, P>(paths: I) -> Vec<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths
            .into_iter()
            .enumerate()
            .map(|(index, path)| Self::new(index, path))
            .collect()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Whether a file was actually read and matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Scanned,
    /// The file contributed nothing; the reason is the rendered error
    Failed(String),
}

/// The outcome of scanning one file across all keywords
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialResult {
    /// Position of the file in the directory listing
    pub index: usize,
    /// The scanned file
    pub path: PathBuf,
    /// One entry per keyword, in keyword order. Each list holds the file's
    /// path if the keyword matched and is empty otherwise.
    pub matches: Vec<(String, Vec<PathBuf>)>,
    pub status: FileStatus,
}

impl PartialResult {
    /// A partial in which every keyword maps to an empty list
    pub fn empty(task: &FileTask, keywords: &KeywordSet, status: FileStatus) -> Self {
        Self {
            index: task.index(),
            path: task.path().to_path_buf(),
            matches: keywords.iter().map(|k| (k.to_string(), Vec::new())).collect(),
            status,
        }
    }

    /// Keywords whose list is non-empty
    pub fn matched_keywords(&self) -> impl Iterator<Item = &str> {
        self.matches
            .iter()
            .filter(|(_, paths)| !paths.is_empty())
            .map(|(k, _)| k.as_str())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, FileStatus::Failed(_))
    }
}

/// Keyword → matching files, in keyword order.
///
/// Every requested keyword has an entry, even with no matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    entries: Vec<(String, Vec<PathBuf>)>,
    positions: HashMap<String, usize>,
    // (entry position, path) pairs already listed
    seen: HashSet<(usize, PathBuf)>,
}

impl AggregateResult {
    /// A result with every keyword of `keywords` mapped to an empty list
    pub fn with_keywords(keywords: &KeywordSet) -> Self {
        let mut result = Self::default();
        for keyword in keywords.iter() {
            result
                .positions
                .insert(keyword.to_string(), result.entries.len());
            result.entries.push((keyword.to_string(), Vec::new()));
        }
        result
    }

    /// Appends `path` under `keyword`.
    ///
    /// Returns false without modifying anything if the keyword is unknown or
    /// the path is already listed under it.
    pub(crate) fn push(&mut self, keyword: &str, path: &Path) -> bool {
        let Some(&pos) = self.positions.get(keyword) else {
            return false;
        };
        if !self.seen.insert((pos, path.to_path_buf())) {
            return false;
        }
        self.entries[pos].1.push(path.to_path_buf());
        true
    }

    pub fn get(&self, keyword: &str) -> Option<&[PathBuf]> {
        self.positions
            .get(keyword)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.entries
            .iter()
            .map(|(k, files)| (k.as_str(), files.as_slice()))
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of keywords
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of (keyword, file) match pairs
    pub fn total_pairs(&self) -> usize {
        self.entries.iter().map(|(_, files)| files.len()).sum()
    }
}

impl Serialize for AggregateResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (keyword, files) in &self.entries {
            map.serialize_entry(keyword, files)?;
        }
        map.end()
    }
}

/// Everything a completed scan returns
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub result: AggregateResult,
    /// Wall-clock time of the scan, directory listing included
    pub elapsed: Duration,
    pub files_scanned: usize,
    pub files_failed: usize,
}
