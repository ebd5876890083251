use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::errors::{ScanError, ScanResult};
use crate::keywords::KeywordSet;

/// Configuration for a scan run.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations, later ones
/// overriding earlier ones:
/// 1. Global `$HOME/.config/keyscout/config.yaml`
/// 2. Local `.keyscout.yaml` in the current directory
/// 3. Custom config file specified via `--config` flag
///
/// # Configuration Format
///
/// ```yaml
/// # Keywords to look for (exact whitespace-delimited tokens)
/// keywords: ["foo", "bar"]
///
/// # Directory whose immediate files are scanned
/// root_path: "./dist"
///
/// # Worker pool size
/// concurrency: 2
///
/// # How to handle invalid UTF-8 (failfast, lossy)
/// encoding_mode: failfast
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// When using the CLI, command-line arguments take precedence over config
/// file values; see [`ScanConfig::merge_with_cli`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Keywords to scan for. Trimmed and deduplicated before use.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Directory whose immediate entries are scanned
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Number of workers in the scan pool
    #[serde(default = "default_concurrency")]
    pub concurrency: NonZeroUsize,

    /// How to handle files that are not valid UTF-8
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// How a worker treats bytes that are not valid UTF-8
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Treat the file as unreadable; it contributes no matches
    #[default]
    FailFast,
    /// Replace invalid sequences with U+FFFD and keep scanning
    Lossy,
}

impl std::str::FromStr for EncodingMode {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "failfast" => Ok(Self::FailFast),
            "lossy" => Ok(Self::Lossy),
            other => Err(ScanError::config_error(format!(
                "Unknown encoding mode '{}', expected failfast or lossy",
                other
            ))),
        }
    }
}

pub fn default_root_path() -> PathBuf {
    PathBuf::from("./dist")
}

pub fn default_concurrency() -> NonZeroUsize {
    NonZeroUsize::MIN.saturating_add(1)
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Values passed on the command line; `None` means the flag was not given
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub keywords: Option<Vec<String>>,
    pub root_path: Option<PathBuf>,
    pub concurrency: Option<NonZeroUsize>,
    pub encoding_mode: Option<EncodingMode>,
    pub log_level: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            root_path: default_root_path(),
            concurrency: default_concurrency(),
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Creates a configuration for `root_path` with the given keywords and defaults elsewhere
    pub fn new(root_path: impl Into<PathBuf>, keywords: Vec<String>) -> Self {
        Self {
            keywords,
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("keyscout/config.yaml")),
            Some(PathBuf::from(".keyscout.yaml")),
        ];

        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicit file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Applies every value given on the command line over the file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(keywords) = cli.keywords.filter(|k| !k.is_empty()) {
            self.keywords = keywords;
        }
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(encoding_mode) = cli.encoding_mode {
            self.encoding_mode = encoding_mode;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }

    /// The keywords as a trimmed, deduplicated set
    pub fn keyword_set(&self) -> KeywordSet {
        self.keywords.iter().collect()
    }

    /// Checks the configuration before a scan
    pub fn validate(&self) -> ScanResult<()> {
        if self.root_path.as_os_str().is_empty() {
            return Err(ScanError::config_error("root_path must not be empty"));
        }

        let cpus = num_cpus::get();
        if self.concurrency.get() > cpus {
            warn!(
                "Concurrency {} exceeds the {} available CPUs",
                self.concurrency, cpus
            );
        }
        Ok(())
    }
}
