use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::scan::worker::{LARGE_FILE_THRESHOLD, SMALL_FILE_THRESHOLD};

/// Counters shared by every worker of a scan.
///
/// Cloning is cheap and all clones observe the same counters.
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    bytes_read: Arc<AtomicU64>,

    files_scanned: Arc<AtomicU64>,
    files_failed: Arc<AtomicU64>,
    keyword_hits: Arc<AtomicU64>,

    // Worker loops currently running, and the most seen at once
    active_workers: Arc<AtomicU64>,
    peak_workers: Arc<AtomicU64>,

    // Read strategy used per file
    small_files_processed: Arc<AtomicU64>,
    buffered_files_processed: Arc<AtomicU64>,
    mmap_files_processed: Arc<AtomicU64>,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            bytes_read: Arc::new(AtomicU64::new(0)),
            files_scanned: Arc::new(AtomicU64::new(0)),
            files_failed: Arc::new(AtomicU64::new(0)),
            keyword_hits: Arc::new(AtomicU64::new(0)),
            active_workers: Arc::new(AtomicU64::new(0)),
            peak_workers: Arc::new(AtomicU64::new(0)),
            small_files_processed: Arc::new(AtomicU64::new(0)),
            buffered_files_processed: Arc::new(AtomicU64::new(0)),
            mmap_files_processed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records which read strategy a file of `size` bytes goes through
    pub fn record_file_processing(&self, size: u64) {
        if size < SMALL_FILE_THRESHOLD {
            self.small_files_processed.fetch_add(1, Ordering::Relaxed);
        } else if size >= LARGE_FILE_THRESHOLD {
            self.mmap_files_processed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.buffered_files_processed
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a successfully matched file
    pub fn record_scanned(&self, bytes: u64, hits: usize) {
        let total = self.bytes_read.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
        self.keyword_hits.fetch_add(hits as u64, Ordering::Relaxed);
        debug!("Read {} bytes, total: {} bytes", bytes, total);
    }

    /// Records a file that contributed nothing because it could not be read
    pub fn record_failure(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_started(&self) {
        let active = self.active_workers.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_workers.fetch_max(active, Ordering::SeqCst);
    }

    pub fn record_worker_finished(&self) {
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            keyword_hits: self.keyword_hits.load(Ordering::Relaxed),
            peak_workers: self.peak_workers.load(Ordering::SeqCst),
            small_files: self.small_files_processed.load(Ordering::Relaxed),
            buffered_files: self.buffered_files_processed.load(Ordering::Relaxed),
            mmap_files: self.mmap_files_processed.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Bytes read: {}\n\
             Files scanned/failed: {}/{}\n\
             Keyword hits: {}\n\
             Peak workers: {}\n\
             Files processed (small/buffered/mmap): {}/{}/{}",
            stats.bytes_read,
            stats.files_scanned,
            stats.files_failed,
            stats.keyword_hits,
            stats.peak_workers,
            stats.small_files,
            stats.buffered_files,
            stats.mmap_files
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub bytes_read: u64,
    pub files_scanned: u64,
    pub files_failed: u64,
    pub keyword_hits: u64,
    pub peak_workers: u64,
    pub small_files: u64,
    pub buffered_files: u64,
    pub mmap_files: u64,
}
