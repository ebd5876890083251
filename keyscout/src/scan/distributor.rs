use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::num::NonZeroUsize;
use tracing::{debug, trace, warn};

use super::matcher::KeywordMatcher;
use super::worker::FileProcessor;
use crate::config::EncodingMode;
use crate::keywords::KeywordSet;
use crate::results::{FileTask, PartialResult};

/// Feeds file tasks to a fixed-size pool of workers
#[derive(Debug, Clone, Copy)]
pub struct Distributor {
    concurrency: NonZeroUsize,
}

/// Pulls tasks until the queue is closed and drained
fn worker_loop(
    id: usize,
    tasks: Receiver<FileTask>,
    results: Sender<PartialResult>,
    processor: &FileProcessor,
) {
    processor.metrics().record_worker_started();
    let mut processed = 0usize;
    while let Ok(task) = tasks.recv() {
        let partial = processor.process_one(&task);
        processed += 1;
        // The receiver outlives the pool, so this only fails if the caller panicked
        if results.send(partial).is_err() {
            break;
        }
    }
    processor.metrics().record_worker_finished();
    trace!("Worker {} exiting after {} files", id, processed);
}

impl Distributor {
    pub fn new(concurrency: NonZeroUsize) -> Self {
        Self { concurrency }
    }

    /// Number of workers a run over `file_count` files starts
    pub fn pool_size(&self, file_count: usize) -> usize {
        self.concurrency.get().min(file_count)
    }

    /// Processes every task exactly once and returns the partials in task
    /// index order.
    ///
    /// Returns immediately without starting any worker when `files` is empty.
    pub fn distribute(&self, files: Vec<FileTask>, processor: &FileProcessor) -> Vec<PartialResult> {
        if files.is_empty() {
            debug!("No files to distribute");
            return Vec::new();
        }

        let file_count = files.len();
        let workers = self.pool_size(file_count);

        // Seed the whole queue, then close it; a closed and drained channel
        // tells workers there is nothing left.
        let (task_tx, task_rx) = bounded(file_count);
        for task in files {
            // Capacity equals the task count and the receiver is held here
            let _ = task_tx.send(task);
        }
        drop(task_tx);

        let (result_tx, result_rx) = unbounded();

        match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("keyscout-worker-{}", i))
            .build()
        {
            Ok(pool) => {
                debug!("Distributing {} files across {} workers", file_count, workers);
                pool.scope(|s| {
                    for id in 0..workers {
                        let tasks = task_rx.clone();
                        let results = result_tx.clone();
                        s.spawn(move |_| worker_loop(id, tasks, results, processor));
                    }
                });
            }
            Err(e) => {
                warn!("Failed to build worker pool ({}), scanning sequentially", e);
                worker_loop(0, task_rx.clone(), result_tx.clone(), processor);
            }
        }
        drop(result_tx);

        let mut partials: Vec<PartialResult> = result_rx.iter().collect();
        debug_assert_eq!(partials.len(), file_count);
        partials.sort_by_key(|p| p.index);
        partials
    }
}

impl Default for Distributor {
    fn default() -> Self {
        Self::new(crate::config::default_concurrency())
    }
}

/// Scans `files` for `keywords` with a pool of `concurrency` workers.
///
/// Partials are returned in the order of `files`.
pub fn distribute(
    files: Vec<FileTask>,
    keywords: &KeywordSet,
    concurrency: NonZeroUsize,
) -> Vec<PartialResult> {
    let processor = FileProcessor::new(KeywordMatcher::new(keywords), EncodingMode::default());
    Distributor::new(concurrency).distribute(files, &processor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn create_files(dir: &tempfile::TempDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.path().join(format!("file_{:03}.txt", i));
                let content = if i % 3 == 0 { "alpha beta" } else { "beta gamma" };
                std::fs::write(&path, content).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_empty_input_returns_immediately() {
        let partials = distribute(Vec::new(), &KeywordSet::parse("foo"), nz(4));
        assert!(partials.is_empty());
    }

    #[test]
    fn test_pool_size_never_exceeds_concurrency() {
        let distributor = Distributor::new(nz(2));
        assert_eq!(distributor.pool_size(100), 2);
        assert_eq!(distributor.pool_size(1), 1);
        assert_eq!(distributor.pool_size(0), 0);
    }

    #[test]
    fn test_running_workers_never_exceed_concurrency() {
        let dir = tempdir().unwrap();
        let paths = create_files(&dir, 200);
        let keywords = KeywordSet::parse("alpha,beta");

        for n in [1, 2, 3, 5] {
            let processor =
                FileProcessor::new(KeywordMatcher::new(&keywords), EncodingMode::FailFast);
            let partials =
                Distributor::new(nz(n)).distribute(FileTask::from_paths(paths.clone()), &processor);
            assert_eq!(partials.len(), paths.len());

            let peak = processor.metrics().get_stats().peak_workers;
            assert!((1..=n as u64).contains(&peak), "concurrency {} peak {}", n, peak);
        }

        // Fewer files than workers: only one worker per file is started
        let processor = FileProcessor::new(KeywordMatcher::new(&keywords), EncodingMode::FailFast);
        Distributor::new(nz(8)).distribute(FileTask::from_paths(paths[..2].to_vec()), &processor);
        assert!(processor.metrics().get_stats().peak_workers <= 2);
    }

    #[test]
    fn test_every_file_processed_exactly_once() {
        let dir = tempdir().unwrap();
        let paths = create_files(&dir, 50);
        let keywords = KeywordSet::parse("alpha,beta");

        for n in [1, 2, 3, 8, 64] {
            let partials = distribute(FileTask::from_paths(paths.clone()), &keywords, nz(n));
            assert_eq!(partials.len(), paths.len(), "concurrency {}", n);

            let indices: HashSet<usize> = partials.iter().map(|p| p.index).collect();
            assert_eq!(indices.len(), paths.len());

            for (i, partial) in partials.iter().enumerate() {
                assert_eq!(partial.index, i);
                assert_eq!(partial.path, paths[i]);
            }
        }
    }

    #[test]
    fn test_partials_carry_matches() {
        let dir = tempdir().unwrap();
        let paths = create_files(&dir, 6);
        let keywords = KeywordSet::parse("alpha");
        let partials = distribute(FileTask::from_paths(paths.clone()), &keywords, nz(2));

        let alpha_hits: Vec<usize> = partials
            .iter()
            .filter(|p| p.matched_keywords().any(|k| k == "alpha"))
            .map(|p| p.index)
            .collect();
        assert_eq!(alpha_hits, vec![0, 3]);
    }

    #[test]
    fn test_failures_do_not_stop_other_files() {
        let dir = tempdir().unwrap();
        let mut paths = create_files(&dir, 4);
        paths.insert(2, dir.path().join("does_not_exist.txt"));

        let keywords = KeywordSet::parse("beta");
        let matcher = KeywordMatcher::new(&keywords);
        let processor = FileProcessor::new(matcher, EncodingMode::FailFast);
        let partials = Distributor::new(nz(2)).distribute(FileTask::from_paths(paths), &processor);

        assert_eq!(partials.len(), 5);
        assert!(partials[2].is_failed());
        assert_eq!(partials.iter().filter(|p| p.is_failed()).count(), 1);

        let stats = processor.metrics().get_stats();
        assert_eq!(stats.files_scanned, 4);
        assert_eq!(stats.files_failed, 1);
    }
}
