use std::{fs, path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wikidata_diff::{
    analyzer::Analyzer,
    config::{AnalyzerConfig, RetryPolicy},
    content::RevisionId,
    http::{HttpSource, HttpSourceConfig, WIKIDATA_API_URL},
};

/// Count what changed in Wikidata revisions compared to their parents.
#[derive(Debug, clap::Parser)]
#[command(version, about)]
struct CommandLine {
    /// Revision IDs to analyze.
    revision_ids: Vec<RevisionId>,
    /// File with more revision IDs, separated by whitespace or commas.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, default_value_t = 50)]
    batch_size: usize,
    #[arg(long, default_value_t = 4)]
    workers: usize,
    /// Attempts per request while rate limited.
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,
    #[arg(long, default_value = WIKIDATA_API_URL)]
    api_url: String,
    /// Include the counts of every revision, not only the totals.
    #[arg(long)]
    details: bool,
}

fn parse_ids(text: &str) -> Result<Vec<RevisionId>, std::num::ParseIntError> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|id| !id.is_empty())
        .map(str::parse)
        .collect()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CommandLine::parse();

    let mut ids = args.revision_ids.clone();
    if let Some(path) = &args.input {
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| parse_ids(&text).map_err(|e| e.to_string()));
        match parsed {
            Ok(more) => ids.extend(more),
            Err(error) => {
                tracing::error!(path = %path.display(), %error, "failed to read revision IDs");
                return ExitCode::FAILURE;
            }
        }
    }

    let source = HttpSource::new(HttpSourceConfig {
        api_url: args.api_url.clone(),
        ..HttpSourceConfig::default()
    });
    let config = AnalyzerConfig::default()
        .with_batch_size(args.batch_size)
        .with_workers(args.workers)
        .with_retry(RetryPolicy::new(
            args.max_attempts,
            Duration::from_millis(args.retry_delay_ms),
        ));

    let mut report = match Analyzer::with_config(source, config).analyze(&ids) {
        Ok(report) => report,
        Err(error) => {
            tracing::error!(%error, "analysis failed");
            return ExitCode::FAILURE;
        }
    };
    if !args.details {
        report.diffs.clear();
    }

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(%error, "failed to serialize report");
            ExitCode::FAILURE
        }
    }
}
