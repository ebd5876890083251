use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Deref;
use std::path::Path;
use tracing::{trace, warn};

use super::matcher::KeywordMatcher;
use crate::config::EncodingMode;
use crate::errors::{ScanError, ScanResult};
use crate::keywords::KeywordSet;
use crate::metrics::ScanMetrics;
use crate::results::{FileStatus, FileTask, PartialResult};

const BUFFER_CAPACITY: usize = 65536;
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 32 * 1024; // 32KB
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Raw bytes of a file, either read into memory or mapped
enum FileBytes {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileBytes::Owned(bytes) => bytes,
            FileBytes::Mapped(mmap) => mmap,
        }
    }
}

fn decode_bytes<'a>(
    bytes: &'a [u8],
    path: &Path,
    encoding_mode: EncodingMode,
) -> ScanResult<Cow<'a, str>> {
    match encoding_mode {
        EncodingMode::FailFast => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| ScanError::encoding_error(path, e)),
        EncodingMode::Lossy => {
            let cow = String::from_utf8_lossy(bytes);
            // Owned means at least one invalid sequence was replaced
            if let Cow::Owned(_) = cow {
                warn!("Invalid UTF-8 replaced in file: {}", path.display());
            }
            Ok(cow)
        }
    }
}

/// Scans one file at a time for a fixed keyword set.
///
/// A processor is shared by reference between all workers of a pool; it
/// holds no per-file state.
#[derive(Debug)]
pub struct FileProcessor {
    matcher: KeywordMatcher,
    metrics: ScanMetrics,
    encoding_mode: EncodingMode,
}

impl FileProcessor {
    pub fn new(matcher: KeywordMatcher, encoding_mode: EncodingMode) -> Self {
        Self {
            matcher,
            metrics: ScanMetrics::new(),
            encoding_mode,
        }
    }

    pub fn keywords(&self) -> &KeywordSet {
        self.matcher.keywords()
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    fn read_small_file(&self, path: &Path) -> ScanResult<FileBytes> {
        std::fs::read(path)
            .map(FileBytes::Owned)
            .map_err(|e| ScanError::from_io(path, e))
    }

    fn read_file_buffered(&self, path: &Path) -> ScanResult<FileBytes> {
        let file = File::open(path).map_err(|e| ScanError::from_io(path, e))?;
        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ScanError::from_io(path, e))?;
        Ok(FileBytes::Owned(bytes))
    }

    fn read_mmap_file(&self, path: &Path) -> ScanResult<FileBytes> {
        let file = File::open(path).map_err(|e| ScanError::from_io(path, e))?;
        // The map is read-only and dropped before process_one returns
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| ScanError::from_io(path, e))?;
        Ok(FileBytes::Mapped(mmap))
    }

    /// Reads the whole file, choosing a strategy by size
    fn read_file(&self, path: &Path) -> ScanResult<FileBytes> {
        match path.metadata() {
            Ok(metadata) => {
                let size = metadata.len();
                self.metrics.record_file_processing(size);

                if size < SMALL_FILE_THRESHOLD {
                    trace!("Using simple file read for: {}", path.display());
                    self.read_small_file(path)
                } else if size >= LARGE_FILE_THRESHOLD {
                    trace!("Using memory map for: {}", path.display());
                    self.read_mmap_file(path)
                } else {
                    self.read_file_buffered(path)
                }
            }
            Err(e) => {
                trace!("Failed to get metadata for {}: {}", path.display(), e);
                self.read_file_buffered(path)
            }
        }
    }

    /// Reads and matches a file, surfacing every failure as an error
    pub fn try_process(&self, task: &FileTask) -> ScanResult<PartialResult> {
        let path = task.path();
        let bytes = self.read_file(path)?;
        let contents = decode_bytes(&bytes, path, self.encoding_mode)?;
        let found = self.matcher.find_keywords(&contents);

        self.metrics.record_scanned(bytes.len() as u64, found.len());
        trace!("{} keywords found in {}", found.len(), path.display());

        let matches = self
            .keywords()
            .iter()
            .map(|keyword| {
                let files = if found.contains(keyword) {
                    vec![path.to_path_buf()]
                } else {
                    Vec::new()
                };
                (keyword.to_string(), files)
            })
            .collect();

        Ok(PartialResult {
            index: task.index(),
            path: path.to_path_buf(),
            matches,
            status: FileStatus::Scanned,
        })
    }

    /// Scans a single file.
    ///
    /// Never fails: an unreadable file is logged and yields a partial in
    /// which every keyword maps to an empty list.
    pub fn process_one(&self, task: &FileTask) -> PartialResult {
        trace!("Processing file: {}", task.path().display());

        match self.try_process(task) {
            Ok(partial) => partial,
            Err(e) => {
                warn!("Skipping {}: {}", task.path().display(), e);
                self.metrics.record_failure();
                PartialResult::empty(task, self.keywords(), FileStatus::Failed(e.to_string()))
            }
        }
    }
}
