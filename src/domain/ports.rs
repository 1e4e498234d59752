use crate::domain::errors::RegistryError;
use crate::domain::metrics::MetricKind;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Destination for the facts extracted from log lines.
///
/// Instruments are declared once at startup and addressed by their base name
/// afterwards. Label combinations are created lazily on first update and live
/// for the rest of the process.
pub trait MetricSink: Send + Sync {
    fn declare(
        &self,
        kind: MetricKind,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<(), RegistryError>;

    /// Add one to the counter for this label combination.
    fn increment(&self, name: &str, label_values: &[&str]) -> Result<(), RegistryError>;

    /// Overwrite the gauge value for this label combination.
    fn set(&self, name: &str, label_values: &[&str], value: f64) -> Result<(), RegistryError>;

    /// Replace the whole payload of an info record.
    fn set_info(&self, name: &str, fields: &HashMap<&str, &str>) -> Result<(), RegistryError>;
}

/// Lazy, unbounded producer of log lines.
///
/// `Ok(None)` marks the end of the stream; the source is not restartable.
#[async_trait]
pub trait LineSource: Send {
    async fn next_line(&mut self) -> Result<Option<String>>;

    /// Human readable description used in logs.
    fn describe(&self) -> String;
}
