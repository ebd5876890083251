/// This module implements the parallel scan-and-aggregate engine.
///
/// # Pipeline
///
/// ```text
/// directory ──list──▶ FileTask* ──▶ Distributor ──▶ PartialResult* ──▶ aggregate ──▶ AggregateResult
///                                     │   ▲
///                                task │   │ partial
///                                     ▼   │
///                                  N × Worker ──▶ KeywordMatcher
/// ```
///
/// # Concurrency Model
///
/// The distributor runs a fixed pool of `N` workers on a dedicated Rayon
/// thread pool. Workers pull tasks from a closed crossbeam channel until it
/// is drained, which is how they learn the queue is exhausted:
/// ```rust,ignore
/// while let Ok(task) = tasks.recv() {
///     results.send(processor.process_one(&task));
/// }
/// ```
///
/// The end of the pool's scope is the only barrier. Aggregation runs after
/// it on the calling thread, so it needs no locking.
///
/// # Error Handling
///
/// Only a missing scan directory aborts a run. Per-file failures are logged
/// by the worker and the file contributes no matches:
/// ```rust,ignore
/// match scan::run(dir, &keywords) {
///     Ok(result) => // Complete mapping, possibly with skipped files,
///     Err(ScanError::DirectoryNotFound(path)) => // Nothing was scanned,
///     Err(e) => // Other fatal error,
/// }
/// ```
pub mod aggregator;
pub mod distributor;
pub mod engine;
pub mod matcher;
pub mod worker;

pub use aggregator::aggregate;
pub use distributor::{distribute, Distributor};
pub use engine::{list_files, run, scan};
pub use matcher::{match_keywords, KeywordMatcher};
pub use worker::FileProcessor;
