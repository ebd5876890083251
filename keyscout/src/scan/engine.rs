use ignore::WalkBuilder;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::aggregator::aggregate;
use super::distributor::Distributor;
use super::matcher::KeywordMatcher;
use super::worker::FileProcessor;
use crate::config::{default_concurrency, EncodingMode, ScanConfig};
use crate::errors::{ScanError, ScanResult};
use crate::keywords::KeywordSet;
use crate::results::{AggregateResult, FileTask, ScanReport};

fn ensure_directory(directory: &Path) -> ScanResult<()> {
    match directory.metadata() {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => {
            warn!("Not a directory: {}", directory.display());
            Err(ScanError::directory_not_found(directory))
        }
        Err(e) => {
            warn!("Cannot open directory {}: {}", directory.display(), e);
            Err(ScanError::directory_not_found(directory))
        }
    }
}

fn listing_error(directory: &Path, err: ignore::Error) -> ScanError {
    let message = err.to_string();
    match err.into_io_error() {
        Some(source) if source.kind() == io::ErrorKind::NotFound => {
            ScanError::directory_not_found(directory)
        }
        Some(source) => ScanError::directory_unreadable(directory, source),
        None => {
            ScanError::directory_unreadable(directory, io::Error::new(io::ErrorKind::Other, message))
        }
    }
}

/// Lists the regular files directly inside `directory`, sorted by file name.
///
/// Hidden files are included; subdirectories and other non-file entries are
/// skipped. Symlinks are followed, so a link to a file is listed. Failing to
/// read `directory` itself is fatal; a bad individual entry is only logged.
pub fn list_files(directory: &Path) -> ScanResult<Vec<PathBuf>> {
    ensure_directory(directory)?;

    let mut walker = WalkBuilder::new(directory);
    walker
        .standard_filters(false)
        .follow_links(true)
        .max_depth(Some(1))
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    for entry in walker.build() {
        let entry = match entry {
            Ok(entry) => entry,
            // Depth 0 means the directory itself could not be read
            Err(e) if e.depth().map_or(true, |depth| depth == 0) => {
                warn!("Cannot list directory {}: {}", directory.display(), e);
                return Err(listing_error(directory, e));
            }
            Err(e) => {
                warn!("Failed to read directory entry: {}", e);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        if entry.file_type().is_some_and(|ft| ft.is_file()) {
            files.push(entry.into_path());
        } else {
            debug!("Skipping non-file entry: {}", entry.path().display());
        }
    }

    debug!("Found {} files in {}", files.len(), directory.display());
    Ok(files)
}

fn execute(
    directory: &Path,
    keywords: &KeywordSet,
    concurrency: NonZeroUsize,
    encoding_mode: EncodingMode,
) -> ScanResult<ScanReport> {
    let start = Instant::now();
    info!(
        "Starting scan of {} for {} keywords",
        directory.display(),
        keywords.len()
    );

    if keywords.is_empty() {
        // The directory must still exist; its contents are irrelevant
        ensure_directory(directory)?;
        debug!("No keywords provided, returning empty result");
        return Ok(ScanReport {
            result: AggregateResult::default(),
            elapsed: start.elapsed(),
            files_scanned: 0,
            files_failed: 0,
        });
    }

    let files = list_files(directory)?;
    let tasks = FileTask::from_paths(files);

    let processor = FileProcessor::new(KeywordMatcher::new(keywords), encoding_mode);
    let partials = Distributor::new(concurrency).distribute(tasks, &processor);

    let files_failed = partials.iter().filter(|p| p.is_failed()).count();
    let files_scanned = partials.len() - files_failed;
    let result = aggregate(partials, keywords);

    processor.metrics().log_stats();

    let elapsed = start.elapsed();
    info!(
        "Scan complete. {} keyword matches across {} files ({} skipped) in {:?}",
        result.total_pairs(),
        files_scanned,
        files_failed,
        elapsed
    );

    Ok(ScanReport {
        result,
        elapsed,
        files_scanned,
        files_failed,
    })
}

/// Scans the immediate files of `directory` for `keywords` using the
/// default worker pool size.
///
/// Fails only when `directory` is missing or cannot be listed; unreadable
/// files are logged and contribute no matches.
pub fn run(directory: impl AsRef<Path>, keywords: &KeywordSet) -> ScanResult<AggregateResult> {
    execute(
        directory.as_ref(),
        keywords,
        default_concurrency(),
        EncodingMode::default(),
    )
    .map(|report| report.result)
}

/// Runs a scan as described by `config`, including timing
pub fn scan(config: &ScanConfig) -> ScanResult<ScanReport> {
    config.validate()?;
    let keywords = config.keyword_set();
    execute(
        &config.root_path,
        &keywords,
        config.concurrency,
        config.encoding_mode,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scan_with_config() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "foo bar").unwrap();
        std::fs::write(dir.path().join("b.txt"), "bar baz").unwrap();

        let mut config = ScanConfig::new(dir.path(), vec!["foo".into(), "bar".into()]);
        config.concurrency = NonZeroUsize::new(1).unwrap();

        let report = scan(&config).unwrap();
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.files_failed, 0);
        assert_eq!(report.result.total_pairs(), 3);
    }

    #[test]
    fn test_list_files_sorted_and_flat() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::write(dir.path().join(".hidden"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("nested.txt"), "").unwrap();

        let files = list_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![".hidden", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_list_files_missing_directory() {
        let dir = tempdir().unwrap();
        let err = list_files(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ScanError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_listing_error_mapping() {
        let dir = Path::new("dist");

        let gone = ignore::Error::Io(io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(listing_error(dir, gone), ScanError::DirectoryNotFound(_)));

        let denied = ignore::Error::Io(io::Error::from(io::ErrorKind::PermissionDenied));
        match listing_error(dir, denied) {
            ScanError::DirectoryUnreadable { path, source } => {
                assert_eq!(path, dir);
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_directory_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("a.txt"), "foo").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can list the directory anyway
        let listable = std::fs::read_dir(&locked).is_ok();
        let result = run(&locked, &KeywordSet::parse("foo"));
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        if listable {
            assert!(result.is_ok());
            return;
        }
        assert!(matches!(result, Err(ScanError::DirectoryUnreadable { .. })));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "foo").unwrap();
        let err = run(&file, &KeywordSet::parse("foo")).unwrap_err();
        assert!(matches!(err, ScanError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_empty_keywords_still_require_directory() {
        let dir = tempdir().unwrap();
        assert!(run(dir.path(), &KeywordSet::new()).unwrap().is_empty());
        assert!(run(dir.path().join("nope"), &KeywordSet::new()).is_err());
    }
}
