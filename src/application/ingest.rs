use crate::application::classifier::{LineClassifier, LineOutcome};
use crate::domain::ports::LineSource;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// How the pipeline stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestEnd {
    /// The source signalled end of stream
    Exhausted,
    /// Reading from the source failed
    SourceFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub lines: u64,
    pub failed: u64,
    pub elapsed: Duration,
    pub end: IngestEnd,
}

/// Pulls lines from a source and classifies them strictly one at a time.
///
/// All registry updates for a line complete before the next line is read.
pub struct IngestPipeline<'a> {
    classifier: &'a LineClassifier,
}

impl<'a> IngestPipeline<'a> {
    pub fn new(classifier: &'a LineClassifier) -> Self {
        Self { classifier }
    }

    pub async fn run(&self, source: &mut dyn LineSource) -> IngestSummary {
        let started = Instant::now();
        let mut lines = 0_u64;
        let mut failed = 0_u64;
        info!("Ingesting log lines from {}", source.describe());

        let end = loop {
            match source.next_line().await {
                Ok(Some(line)) => {
                    lines += 1;
                    if self.classifier.classify(&line) == LineOutcome::Failed {
                        failed += 1;
                    }
                }
                Ok(None) => {
                    info!("Log source {} reached end of stream", source.describe());
                    break IngestEnd::Exhausted;
                }
                Err(e) => {
                    error!("Failed to read from log source {}: {:#}", source.describe(), e);
                    break IngestEnd::SourceFailed;
                }
            }
        };

        let summary = IngestSummary {
            lines,
            failed,
            elapsed: started.elapsed(),
            end,
        };
        debug!("Ingest summary: {:?}", summary);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics;
    use crate::infrastructure::mock::{RecordingSink, StaticLogSource};
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct BrokenSource {
        served: bool,
    }

    #[async_trait]
    impl LineSource for BrokenSource {
        async fn next_line(&mut self) -> Result<Option<String>> {
            if self.served {
                bail!("pipe closed unexpectedly");
            }
            self.served = true;
            Ok(Some("sending connect request".to_string()))
        }

        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    #[tokio::test]
    async fn test_run_until_exhausted() {
        let sink = Arc::new(RecordingSink::with_catalogue());
        let classifier = LineClassifier::new(sink.clone()).unwrap();
        let mut source = StaticLogSource::new([
            "sending proposal request",
            "sending proposal request",
            "bb=1.2.3|ba=1|ob=1|oa=1|q=0|pos=0|vol=0",
        ]);

        let summary = IngestPipeline::new(&classifier).run(&mut source).await;

        assert_eq!(summary.end, IngestEnd::Exhausted);
        assert_eq!(summary.lines, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(sink.counter(metrics::PROPOSAL_REQUESTS_SENT, &[]), 2);
        assert_eq!(sink.counter(metrics::ERROR_COUNT, &[]), 1);
    }

    #[tokio::test]
    async fn test_source_error_ends_ingest() {
        let sink = Arc::new(RecordingSink::with_catalogue());
        let classifier = LineClassifier::new(sink.clone()).unwrap();
        let mut source = BrokenSource { served: false };

        let summary = IngestPipeline::new(&classifier).run(&mut source).await;

        assert_eq!(summary.end, IngestEnd::SourceFailed);
        assert_eq!(summary.lines, 1);
        assert_eq!(sink.counter(metrics::CONNECT_REQUESTS_SENT, &[]), 1);
        // Source failures are not classification errors
        assert_eq!(sink.counter(metrics::ERROR_COUNT, &[]), 0);
    }
}
