use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use keyscout::{CliOverrides, EncodingMode, KeywordSet, ScanConfig, ScanReport};
use std::io::{self, BufRead, Write};
use std::{num::NonZeroUsize, path::PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Find which files contain which keywords", long_about = None)]
struct Cli {
    /// Directory whose files are scanned (not recursive)
    #[arg(short = 'd', long)]
    dir: Option<PathBuf>,

    /// Comma-separated keywords; prompted for on stdin when omitted
    #[arg(short = 'k', long)]
    keywords: Option<String>,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// How to handle invalid UTF-8 sequences (failfast|lossy)
    #[arg(long)]
    encoding: Option<EncodingMode>,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the keyword mapping as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = ScanConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let overrides = CliOverrides {
        keywords: cli.keywords.as_deref().map(|k| KeywordSet::parse(k).into()),
        root_path: cli.dir.clone(),
        concurrency: cli.threads,
        encoding_mode: cli.encoding,
        log_level: verbosity_level(cli.verbose).map(str::to_string),
    };
    let mut config = file_config.merge_with_cli(overrides);

    init_tracing(&config.log_level);
    debug!("Effective configuration: {:?}", config);

    if config.keywords.is_empty() {
        config.keywords = prompt_keywords(cli.json)?.into();
    }

    let report = keyscout::scan(&config)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.result)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Log level requested with `-v`; none leaves the configured level alone
fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Reads keywords from stdin. The prompt goes to stderr when stdout carries JSON.
fn prompt_keywords(json: bool) -> Result<KeywordSet> {
    const PROMPT: &str = "Enter keywords separated by commas: ";
    if json {
        eprint!("{}", PROMPT);
        io::stderr().flush()?;
    } else {
        print!("{}", PROMPT);
        io::stdout().flush()?;
    }

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read keywords from stdin")?;
    Ok(KeywordSet::parse(&line))
}

fn print_report(report: &ScanReport) {
    println!(
        "Execution time: {:.10} seconds ({})",
        report.elapsed.as_secs_f64(),
        humantime::format_duration(report.elapsed)
    );

    for (keyword, files) in report.result.iter() {
        if files.is_empty() {
            println!("{}: {}", keyword.blue(), "no matches".dimmed());
            continue;
        }
        println!("{}:", keyword.blue());
        for file in files {
            println!("  {}", file.display().to_string().green());
        }
    }

    println!(
        "\nScanned {} files ({} unreadable), {} keyword matches",
        report.files_scanned,
        report.files_failed,
        report.result.total_pairs()
    );
}
