use tracing::debug;

use crate::keywords::KeywordSet;
use crate::results::{AggregateResult, PartialResult};

/// Folds partial results into a single keyword → files mapping.
///
/// Every keyword starts with an empty list; partials are applied in the order
/// given, appending their paths. Keywords outside `keywords` are ignored and
/// a path is never listed twice under the same keyword.
pub fn aggregate<I>(partials: I, keywords: &KeywordSet) -> AggregateResult
where
    I: IntoIterator<Item = PartialResult>,
{
    let mut result = AggregateResult::with_keywords(keywords);
    let mut folded = 0usize;

    for partial in partials {
        folded += 1;
        for (keyword, paths) in &partial.matches {
            for path in paths {
                result.push(keyword, path);
            }
        }
    }

    debug!(
        "Aggregated {} partials into {} keywords ({} pairs)",
        folded,
        result.len(),
        result.total_pairs()
    );
    result
}
