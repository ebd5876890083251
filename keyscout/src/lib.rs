pub mod config;
pub mod errors;
pub mod keywords;
pub mod metrics;
pub mod results;
pub mod scan;

pub use crate::config::{CliOverrides, EncodingMode, ScanConfig};
pub use crate::errors::{ScanError, ScanResult};
pub use keywords::KeywordSet;
pub use results::{AggregateResult, FileStatus, FileTask, PartialResult, ScanReport};
pub use scan::{aggregate, distribute, run, scan};
