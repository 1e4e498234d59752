use crate::domain::errors::RegistryError;
use crate::domain::metrics::{MetricKind, declare_catalogue};
use crate::domain::ports::{LineSource, MetricSink};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

type SeriesKey = (String, Vec<String>);

#[derive(Default)]
struct RecordingState {
    declared: HashMap<String, (MetricKind, Vec<String>)>,
    counters: HashMap<SeriesKey, u64>,
    gauges: HashMap<SeriesKey, f64>,
    infos: HashMap<String, HashMap<String, String>>,
    failing: HashSet<String>,
}

/// In-memory metric sink applying the same declaration rules as the
/// Prometheus registry, with inspection helpers for tests.
#[derive(Default)]
pub struct RecordingSink {
    state: Mutex<RecordingState>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink with the exporter's full catalogue declared
    pub fn with_catalogue() -> Self {
        let sink = Self::new();
        declare_catalogue(&sink).expect("catalogue declares");
        sink
    }

    /// Make every update of `name` fail with a backend error
    pub fn fail_updates_of(&self, name: &str) {
        self.lock().failing.insert(name.to_string());
    }

    pub fn counter(&self, name: &str, labels: &[&str]) -> u64 {
        self.lock()
            .counters
            .get(&key(name, labels))
            .copied()
            .unwrap_or(0)
    }

    pub fn gauge(&self, name: &str, labels: &[&str]) -> Option<f64> {
        self.lock().gauges.get(&key(name, labels)).copied()
    }

    pub fn info(&self, name: &str) -> Option<HashMap<String, String>> {
        self.lock().infos.get(name).cloned()
    }

    /// Every counter series with a non-zero count
    pub fn counters(&self) -> HashMap<SeriesKey, u64> {
        self.lock().counters.clone()
    }

    pub fn gauges(&self) -> HashMap<SeriesKey, f64> {
        self.lock().gauges.clone()
    }

    pub fn infos(&self) -> HashMap<String, HashMap<String, String>> {
        self.lock().infos.clone()
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(
        state: &RecordingState,
        name: &str,
        expected: MetricKind,
        label_values: Option<&[&str]>,
    ) -> Result<(), RegistryError> {
        let (actual, labels) = state
            .declared
            .get(name)
            .ok_or_else(|| RegistryError::UnknownMetric {
                name: name.to_string(),
            })?;
        if *actual != expected {
            return Err(RegistryError::KindMismatch {
                name: name.to_string(),
                expected,
                actual: *actual,
            });
        }
        if let Some(values) = label_values {
            if values.len() != labels.len() {
                return Err(RegistryError::LabelCardinality {
                    name: name.to_string(),
                    expected: labels.len(),
                    actual: values.len(),
                });
            }
        }
        if state.failing.contains(name) {
            return Err(RegistryError::Backend(prometheus::Error::Msg(format!(
                "injected failure for {}",
                name
            ))));
        }
        Ok(())
    }
}

fn key(name: &str, labels: &[&str]) -> SeriesKey {
    (
        name.to_string(),
        labels.iter().map(|l| l.to_string()).collect(),
    )
}

impl MetricSink for RecordingSink {
    fn declare(
        &self,
        kind: MetricKind,
        name: &str,
        _help: &str,
        label_names: &[&str],
    ) -> Result<(), RegistryError> {
        let mut state = self.lock();
        if state.declared.contains_key(name) {
            return Err(RegistryError::Duplicate {
                name: name.to_string(),
            });
        }
        state.declared.insert(
            name.to_string(),
            (kind, label_names.iter().map(|l| l.to_string()).collect()),
        );
        Ok(())
    }

    fn increment(&self, name: &str, label_values: &[&str]) -> Result<(), RegistryError> {
        let mut state = self.lock();
        Self::check(&state, name, MetricKind::Counter, Some(label_values))?;
        *state.counters.entry(key(name, label_values)).or_insert(0) += 1;
        Ok(())
    }

    fn set(&self, name: &str, label_values: &[&str], value: f64) -> Result<(), RegistryError> {
        let mut state = self.lock();
        Self::check(&state, name, MetricKind::Gauge, Some(label_values))?;
        state.gauges.insert(key(name, label_values), value);
        Ok(())
    }

    fn set_info(&self, name: &str, fields: &HashMap<&str, &str>) -> Result<(), RegistryError> {
        let mut state = self.lock();
        Self::check(&state, name, MetricKind::Info, None)?;
        let expected: BTreeSet<String> = state.declared[name].1.iter().cloned().collect();
        let actual: BTreeSet<String> = fields.keys().map(|k| k.to_string()).collect();
        if expected != actual {
            return Err(RegistryError::InfoKeys {
                name: name.to_string(),
                expected: expected.into_iter().collect(),
                actual: actual.into_iter().collect(),
            });
        }
        state.infos.insert(
            name.to_string(),
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        Ok(())
    }
}

/// Finite, canned sequence of lines
pub struct StaticLogSource {
    lines: VecDeque<String>,
}

impl StaticLogSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl LineSource for StaticLogSource {
    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    fn describe(&self) -> String {
        "static lines".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::CATALOGUE;

    #[test]
    fn test_with_catalogue_declares_every_instrument() {
        let sink = RecordingSink::with_catalogue();
        for descriptor in CATALOGUE {
            let err = sink
                .declare(
                    descriptor.kind,
                    descriptor.name,
                    descriptor.help,
                    descriptor.labels,
                )
                .unwrap_err();
            assert!(
                matches!(err, RegistryError::Duplicate { .. }),
                "{} not declared",
                descriptor.name
            );
        }
    }
}
