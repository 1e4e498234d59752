//! Configuration module for the exporter.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Log Source and Observability.

mod log_source_config;
mod observability_config;

pub use log_source_config::LogSourceEnvConfig;
pub use observability_config::ObservabilityEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Where log lines come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// Spawn and tail the configured command
    Process,
    /// Read lines piped into standard input
    Stdin,
}

impl FromStr for SourceMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "process" => Ok(SourceMode::Process),
            "stdin" => Ok(SourceMode::Stdin),
            _ => anyhow::bail!("Invalid LOG_SOURCE: {}. Must be 'process' or 'stdin'", s),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_mode: SourceMode,
    pub log_source: LogSourceEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let mode_str = env::var("LOG_SOURCE").unwrap_or_else(|_| "process".to_string());
        let source_mode = SourceMode::from_str(&mode_str)?;

        let log_source =
            LogSourceEnvConfig::from_env().context("Failed to load log source config")?;
        let observability =
            ObservabilityEnvConfig::from_env().context("Failed to load observability config")?;

        Ok(Self {
            source_mode,
            log_source,
            observability,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_mode: SourceMode::Process,
            log_source: LogSourceEnvConfig::default(),
            observability: ObservabilityEnvConfig::default(),
        }
    }
}
