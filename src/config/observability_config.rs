//! Scrape endpoint configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Observability environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityEnvConfig {
    pub port: u16,
    pub bind_address: String,
    /// Prefix for every exposed metric name
    pub namespace: Option<String>,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            port: 8086,
            bind_address: "0.0.0.0".to_string(),
            namespace: None,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let port = match env::var("EXPORTER_PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid EXPORTER_PORT: {}", raw))?,
            Err(_) => defaults.port,
        };
        Ok(Self {
            port,
            bind_address: env::var("EXPORTER_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            namespace: env::var("METRICS_NAMESPACE")
                .ok()
                .map(|ns| ns.trim().to_string())
                .filter(|ns| !ns.is_empty()),
        })
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
