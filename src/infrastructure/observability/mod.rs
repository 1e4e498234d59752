//! Pull-based observability for the exporter
//!
//! The registry holds every instrument derived from the monitored process's
//! logs; the scrape endpoint renders it in Prometheus text format on demand.

pub mod info;
pub mod metrics;
pub mod server;

pub use metrics::PrometheusRegistry;
