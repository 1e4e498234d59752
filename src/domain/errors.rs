use thiserror::Error;

use crate::domain::metrics::MetricKind;

/// Errors raised by a metric sink when an instrument is declared or updated
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Metric already declared: {name}")]
    Duplicate { name: String },

    #[error("Unknown metric: {name}")]
    UnknownMetric { name: String },

    #[error("Metric {name} is a {actual}, not a {expected}")]
    KindMismatch {
        name: String,
        expected: MetricKind,
        actual: MetricKind,
    },

    #[error("Metric {name} expects {expected} label values, got {actual}")]
    LabelCardinality {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Info record {name} expects keys {expected:?}, got {actual:?}")]
    InfoKeys {
        name: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Metrics backend error: {0}")]
    Backend(#[from] prometheus::Error),
}

/// Errors raised while extracting fields from a single log line
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("No value segment after {marker:?}")]
    MissingSegment { marker: &'static str },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mismatch_formatting() {
        let err = RegistryError::KindMismatch {
            name: "spread".to_string(),
            expected: MetricKind::Counter,
            actual: MetricKind::Gauge,
        };
        assert_eq!(err.to_string(), "Metric spread is a gauge, not a counter");
    }

    #[test]
    fn test_invalid_number_formatting() {
        let err = ExtractionError::InvalidNumber {
            field: "bb",
            value: "1.2.3".to_string(),
        };
        assert!(err.to_string().contains("bb"));
        assert!(err.to_string().contains("1.2.3"));
    }

    #[test]
    fn test_registry_error_is_transparent_in_extraction() {
        let err: ExtractionError = RegistryError::UnknownMetric {
            name: "missing".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Unknown metric: missing");
    }
}
