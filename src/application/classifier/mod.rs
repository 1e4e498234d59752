//! Line classification and extraction
//!
//! Every line runs through the full rule list in a fixed order. Rules are
//! independent except for the phrase chains inside a rule, which are
//! first-match-wins. Any extraction error aborts the rest of that line and is
//! counted on the `error_count` counter; it never reaches the intake loop.

pub mod rules;

use crate::domain::metrics;
use crate::domain::ports::MetricSink;
use anyhow::{Context, Result};
use rules::{
    DataFrameIdPattern, DataFrameRule, ErrorTagRule, ExtractionRule, MarketSnapshotRule,
    PhraseChain, ValidatorIdentityRule,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, trace};

/// Result of classifying one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Processed,
    /// A rule failed; remaining rules were skipped and the error counted
    Failed,
}

#[derive(Debug, Default)]
pub struct ClassifierStats {
    lines: AtomicU64,
    failed: AtomicU64,
}

impl ClassifierStats {
    pub fn lines(&self) -> u64 {
        self.lines.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

pub struct LineClassifier {
    rules: Vec<Box<dyn ExtractionRule>>,
    sink: Arc<dyn MetricSink>,
    stats: ClassifierStats,
}

impl LineClassifier {
    /// Classifier with the standard rule set, in priority order
    pub fn new(sink: Arc<dyn MetricSink>) -> Result<Self> {
        Ok(Self::with_rules(sink, default_rules()?))
    }

    pub fn with_rules(sink: Arc<dyn MetricSink>, rules: Vec<Box<dyn ExtractionRule>>) -> Self {
        Self {
            rules,
            sink,
            stats: ClassifierStats::default(),
        }
    }

    pub fn classify(&self, line: &str) -> LineOutcome {
        self.stats.lines.fetch_add(1, Ordering::Relaxed);

        for rule in &self.rules {
            if let Err(e) = rule.apply(line, self.sink.as_ref()) {
                error!(rule = rule.name(), "Error parsing log line: {}", e);
                trace!("Offending line: {}", line);
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = self.sink.increment(metrics::ERROR_COUNT, &[]) {
                    error!("Failed to record parse error: {}", e);
                }
                return LineOutcome::Failed;
            }
        }
        LineOutcome::Processed
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn stats(&self) -> &ClassifierStats {
        &self.stats
    }
}

/// The standard rules; `[error]` tagging always runs last
pub fn default_rules() -> Result<Vec<Box<dyn ExtractionRule>>> {
    let ids = DataFrameIdPattern::new().context("Invalid data frame id pattern")?;
    let rules: Vec<Box<dyn ExtractionRule>> = vec![
        Box::new(DataFrameRule::new(ids.clone())),
        Box::new(PhraseChain::proposals()),
        Box::new(PhraseChain::connections()),
        Box::new(PhraseChain::strategy_executions()),
        Box::new(PhraseChain::adjustments()),
        Box::new(MarketSnapshotRule::new(ids).context("Invalid market snapshot pattern")?),
        Box::new(ValidatorIdentityRule::new().context("Invalid uptime pattern")?),
        Box::new(ErrorTagRule),
    ];
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ExtractionError;
    use crate::infrastructure::mock::RecordingSink;

    fn classifier() -> (Arc<RecordingSink>, LineClassifier) {
        let sink = Arc::new(RecordingSink::with_catalogue());
        let classifier = LineClassifier::new(sink.clone()).expect("classifier");
        (sink, classifier)
    }

    struct Failing;

    impl ExtractionRule for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn apply(&self, _line: &str, _sink: &dyn MetricSink) -> Result<(), ExtractionError> {
            Err(ExtractionError::MissingSegment { marker: "x" })
        }
    }

    #[test]
    fn test_rule_order() {
        let (_, classifier) = classifier();
        assert_eq!(
            classifier.rule_names(),
            vec![
                "data_frame",
                "proposal",
                "connection",
                "strategy_execution",
                "adjustment",
                "market_snapshot",
                "validator_identity",
                "error_tag",
            ]
        );
    }

    #[test]
    fn test_failure_aborts_remaining_rules_and_counts_error() {
        let sink = Arc::new(RecordingSink::with_catalogue());
        let classifier = LineClassifier::with_rules(
            sink.clone(),
            vec![Box::new(Failing) as Box<dyn ExtractionRule>, Box::new(ErrorTagRule)],
        );

        let outcome = classifier.classify("[error] after a failure");

        assert_eq!(outcome, LineOutcome::Failed);
        // Counted once by the boundary, the tag rule never ran
        assert_eq!(sink.counter(metrics::ERROR_COUNT, &[]), 1);
        assert_eq!(classifier.stats().failed(), 1);
    }

    #[test]
    fn test_independent_rules_fire_on_one_line() {
        let (sink, classifier) = classifier();
        classifier.classify("[strategy_executor] sending proposal request; order levels [ERROR]");
        assert_eq!(sink.counter(metrics::STRATEGY_EXECUTIONS, &[]), 1);
        assert_eq!(sink.counter(metrics::PROPOSAL_REQUESTS_SENT, &[]), 1);
        assert_eq!(sink.counter(metrics::ORDER_LEVEL_ADJUSTMENTS, &[]), 1);
        assert_eq!(sink.counter(metrics::ERROR_COUNT, &[]), 1);
    }

    #[test]
    fn test_sink_failure_is_contained() {
        let (sink, classifier) = classifier();
        sink.fail_updates_of(metrics::PROPOSAL_REQUESTS_SENT);

        let outcome = classifier.classify("sending proposal request");

        assert_eq!(outcome, LineOutcome::Failed);
        assert_eq!(sink.counter(metrics::ERROR_COUNT, &[]), 1);
        assert_eq!(
            classifier.classify("received proposal response"),
            LineOutcome::Processed
        );
        assert_eq!(classifier.stats().lines(), 2);
    }
}
