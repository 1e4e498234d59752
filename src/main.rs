//! Trade log exporter - Prometheus metrics from a running process's log output
//!
//! Tails the monitored process (by default `docker logs -f elixir`), classifies
//! every line, and serves the derived metrics for scraping.
//!
//! # Usage
//! ```sh
//! cargo run -- --port 8086 --container elixir
//! docker logs -f elixir | cargo run -- --stdin
//! ```
//!
//! # Environment Variables
//! - `EXPORTER_PORT` / `EXPORTER_BIND_ADDRESS` - Scrape endpoint (default: 0.0.0.0:8086)
//! - `METRICS_NAMESPACE` - Optional prefix for every metric name
//! - `LOG_SOURCE` - `process` (default) or `stdin`
//! - `LOG_SOURCE_COMMAND` / `LOG_SOURCE_FOLLOW_ARGS` / `LOG_SOURCE_CONTAINER` - Tailed command
//! - `LOG_SOURCE_INCLUDE_STDERR` - Also classify the command's stderr (default: false)

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use tradelog_exporter::application::ingest::IngestEnd;
use tradelog_exporter::application::system::{Application, RunOutcome};
use tradelog_exporter::config::{Config, SourceMode};

#[derive(Parser)]
#[command(name = "tradelog-exporter", about = "Prometheus exporter for trading validator logs")]
struct Cli {
    /// Scrape endpoint port
    #[arg(long)]
    port: Option<u16>,

    /// Scrape endpoint bind address
    #[arg(long)]
    bind: Option<String>,

    /// Container whose logs are followed
    #[arg(long)]
    container: Option<String>,

    /// Read log lines from standard input instead of spawning the log command
    #[arg(long, default_value_t = false)]
    stdin: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.observability.port = port;
        }
        if let Some(bind) = self.bind {
            config.observability.bind_address = bind;
        }
        if let Some(container) = self.container {
            config.log_source.container = container;
        }
        if self.stdin {
            config.source_mode = SourceMode::Stdin;
        }
    }
}

/// `RUST_LOG` directives when present and valid, `info` otherwise
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with(stdout_layer)
        .init();

    info!("Trade log exporter {} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env()?;
    Cli::parse().apply(&mut config);

    let app = Application::build(config)?;
    match app.run().await? {
        RunOutcome::Ingested(summary) => {
            info!(
                "Ingested {} lines ({} failed) in {:?}",
                summary.lines, summary.failed, summary.elapsed
            );
            if summary.end == IngestEnd::SourceFailed {
                bail!("Log source failed");
            }
        }
        RunOutcome::Interrupted => info!("Exiting..."),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_log_filter_honours_rust_log() {
        assert_eq!(
            log_filter(Some("debug".to_string())).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            log_filter(Some("warn".to_string())).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn test_log_filter_falls_back_on_invalid_directives() {
        assert_eq!(
            log_filter(Some("tradelog_exporter=loud".to_string())).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
