use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::application::classifier::LineClassifier;
use crate::application::ingest::{IngestPipeline, IngestSummary};
use crate::config::{Config, SourceMode};
use crate::domain::ports::LineSource;
use crate::infrastructure::log_source::{ProcessLogSource, ReaderLogSource};
use crate::infrastructure::observability::{PrometheusRegistry, server};

/// Why the service stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Ingested(IngestSummary),
    Interrupted,
}

pub struct Application {
    pub config: Config,
    pub registry: PrometheusRegistry,
    pub classifier: LineClassifier,
}

impl Application {
    /// Declare every instrument and build the classifier. Nothing is bound or spawned yet.
    pub fn build(config: Config) -> Result<Self> {
        info!(
            "Building exporter (source: {:?}, endpoint: {})",
            config.source_mode,
            config.observability.listen_address()
        );

        let registry = PrometheusRegistry::with_catalogue(config.observability.namespace.as_deref())
            .context("Failed to declare metrics")?;
        let classifier = LineClassifier::new(Arc::new(registry.clone()))?;
        info!("Classifier rules: {}", classifier.rule_names().join(", "));

        Ok(Self {
            config,
            registry,
            classifier,
        })
    }

    /// Open the configured log source
    pub fn open_source(&self) -> Result<Box<dyn LineSource>> {
        match self.config.source_mode {
            SourceMode::Process => Ok(Box::new(ProcessLogSource::spawn(&self.config.log_source)?)),
            SourceMode::Stdin => Ok(Box::new(ReaderLogSource::new(
                BufReader::new(tokio::io::stdin()),
                "stdin",
            ))),
        }
    }

    /// Bind the scrape endpoint, open the source and ingest until the source
    /// ends or Ctrl+C arrives.
    pub async fn run(self) -> Result<RunOutcome> {
        let addr = self.config.observability.listen_address();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind metrics endpoint on {}", addr))?;
        let mut source = self.open_source()?;
        self.serve_and_ingest(listener, source.as_mut()).await
    }

    /// Serve scrapes on `listener` while `source` is ingested.
    /// The endpoint is up before the first line is read.
    pub async fn serve_and_ingest(
        &self,
        listener: TcpListener,
        source: &mut dyn LineSource,
    ) -> Result<RunOutcome> {
        let registry = self.registry.clone();
        let server = tokio::spawn(async move {
            if let Err(e) = server::serve(listener, registry).await {
                warn!("Metrics endpoint stopped: {}", e);
            }
        });

        let pipeline = IngestPipeline::new(&self.classifier);
        let outcome = tokio::select! {
            summary = pipeline.run(source) => Ok(RunOutcome::Ingested(summary)),
            signal = tokio::signal::ctrl_c() => signal
                .map(|()| {
                    info!("Shutdown signal received.");
                    RunOutcome::Interrupted
                })
                .context("Failed to listen for Ctrl+C"),
        };

        server.abort();
        let stats = self.classifier.stats();
        info!(
            "Exporter stopping: {} lines classified, {} failed",
            stats.lines(),
            stats.failed()
        );
        outcome
    }
}
