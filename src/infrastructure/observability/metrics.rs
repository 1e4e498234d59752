//! Prometheus-backed metric registry
//!
//! Instruments are declared by base name and exposed with the conventional
//! suffixes (`_total` for counters, `_info` for info records).

use crate::domain::errors::RegistryError;
use crate::domain::metrics::{MetricKind, declare_catalogue};
use crate::domain::ports::MetricSink;
use crate::infrastructure::observability::info::InfoRecord;
use prometheus::{CounterVec, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

#[derive(Clone)]
enum Instrument {
    Counter(CounterVec),
    Gauge(GaugeVec),
    Info(InfoRecord),
}

impl Instrument {
    fn kind(&self) -> MetricKind {
        match self {
            Instrument::Counter(_) => MetricKind::Counter,
            Instrument::Gauge(_) => MetricKind::Gauge,
            Instrument::Info(_) => MetricKind::Info,
        }
    }
}

#[derive(Clone)]
struct Entry {
    instrument: Instrument,
    labels: Vec<String>,
}

impl Entry {
    fn check_cardinality(&self, name: &str, label_values: &[&str]) -> Result<(), RegistryError> {
        if label_values.len() != self.labels.len() {
            return Err(RegistryError::LabelCardinality {
                name: name.to_string(),
                expected: self.labels.len(),
                actual: label_values.len(),
            });
        }
        Ok(())
    }
}

/// Process-wide registry of the exporter's instruments
#[derive(Clone)]
pub struct PrometheusRegistry {
    registry: Arc<Registry>,
    namespace: Option<String>,
    instruments: Arc<RwLock<HashMap<String, Entry>>>,
}

impl PrometheusRegistry {
    /// Create an empty registry. A non-empty `namespace` prefixes every exposed name.
    pub fn new(namespace: Option<&str>) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            namespace: namespace
                .filter(|ns| !ns.is_empty())
                .map(str::to_string),
            instruments: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a registry with the full instrument catalogue declared, plus the
    /// standard `process_*` metrics where the platform provides them
    pub fn with_catalogue(namespace: Option<&str>) -> Result<Self, RegistryError> {
        let registry = Self::new(namespace);

        #[cfg(target_os = "linux")]
        {
            let process_collector = prometheus::process_collector::ProcessCollector::for_self();
            registry.registry.register(Box::new(process_collector))?;
        }

        declare_catalogue(&registry)?;
        Ok(registry)
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        match encoder.encode_to_string(&metric_families) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to encode metrics: {}", e);
                String::new()
            }
        }
    }

    fn opts(&self, kind: MetricKind, name: &str, help: &str) -> Opts {
        let opts = Opts::new(format!("{}{}", name, kind.exposition_suffix()), help);
        match &self.namespace {
            Some(ns) => opts.namespace(ns.clone()),
            None => opts,
        }
    }

    fn lookup(&self, name: &str, expected: MetricKind) -> Result<Entry, RegistryError> {
        let instruments = self
            .instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = instruments
            .get(name)
            .ok_or_else(|| RegistryError::UnknownMetric {
                name: name.to_string(),
            })?;
        let actual = entry.instrument.kind();
        if actual != expected {
            return Err(RegistryError::KindMismatch {
                name: name.to_string(),
                expected,
                actual,
            });
        }
        Ok(entry.clone())
    }
}

impl MetricSink for PrometheusRegistry {
    fn declare(
        &self,
        kind: MetricKind,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<(), RegistryError> {
        let mut instruments = self
            .instruments
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if instruments.contains_key(name) {
            return Err(RegistryError::Duplicate {
                name: name.to_string(),
            });
        }

        let opts = self.opts(kind, name, help);
        let instrument = match kind {
            MetricKind::Counter => {
                let vec = CounterVec::new(opts, label_names)?;
                self.registry.register(Box::new(vec.clone()))?;
                Instrument::Counter(vec)
            }
            MetricKind::Gauge => {
                let vec = GaugeVec::new(opts, label_names)?;
                self.registry.register(Box::new(vec.clone()))?;
                Instrument::Gauge(vec)
            }
            MetricKind::Info => {
                let info = InfoRecord::new(opts, label_names)?;
                self.registry.register(Box::new(info.clone()))?;
                Instrument::Info(info)
            }
        };

        // Unlabelled series are visible at zero before the first update
        if label_names.is_empty() {
            let no_labels: &[&str] = &[];
            match &instrument {
                Instrument::Counter(vec) => {
                    vec.get_metric_with_label_values(no_labels)?;
                }
                Instrument::Gauge(vec) => {
                    vec.get_metric_with_label_values(no_labels)?;
                }
                Instrument::Info(_) => {}
            }
        }

        debug!("Declared {} {}", kind, name);
        instruments.insert(
            name.to_string(),
            Entry {
                instrument,
                labels: label_names.iter().map(|l| l.to_string()).collect(),
            },
        );
        Ok(())
    }

    fn increment(&self, name: &str, label_values: &[&str]) -> Result<(), RegistryError> {
        let entry = self.lookup(name, MetricKind::Counter)?;
        entry.check_cardinality(name, label_values)?;
        if let Instrument::Counter(vec) = &entry.instrument {
            vec.get_metric_with_label_values(label_values)?.inc();
        }
        Ok(())
    }

    fn set(&self, name: &str, label_values: &[&str], value: f64) -> Result<(), RegistryError> {
        let entry = self.lookup(name, MetricKind::Gauge)?;
        entry.check_cardinality(name, label_values)?;
        if let Instrument::Gauge(vec) = &entry.instrument {
            vec.get_metric_with_label_values(label_values)?.set(value);
        }
        Ok(())
    }

    fn set_info(&self, name: &str, fields: &HashMap<&str, &str>) -> Result<(), RegistryError> {
        let entry = self.lookup(name, MetricKind::Info)?;
        let expected: BTreeSet<&str> = entry.labels.iter().map(String::as_str).collect();
        let actual: BTreeSet<&str> = fields.keys().copied().collect();
        if expected != actual {
            return Err(RegistryError::InfoKeys {
                name: name.to_string(),
                expected: expected.into_iter().map(str::to_string).collect(),
                actual: actual.into_iter().map(str::to_string).collect(),
            });
        }
        if let Instrument::Info(info) = &entry.instrument {
            info.replace(fields)?;
        }
        Ok(())
    }
}
