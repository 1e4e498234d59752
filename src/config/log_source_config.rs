//! Log source configuration parsing from environment variables.
//!
//! The default source follows the `elixir` container's output through
//! `docker logs -f`.

use anyhow::{Result, bail};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSourceEnvConfig {
    pub command: String,
    /// Arguments placed before the container name
    pub follow_args: Vec<String>,
    pub container: String,
    pub include_stderr: bool,
}

impl Default for LogSourceEnvConfig {
    fn default() -> Self {
        Self {
            command: "docker".to_string(),
            follow_args: vec!["logs".to_string(), "-f".to_string()],
            container: "elixir".to_string(),
            include_stderr: false,
        }
    }
}

impl LogSourceEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let follow_args = match env::var("LOG_SOURCE_FOLLOW_ARGS") {
            Ok(raw) => raw.split_whitespace().map(str::to_string).collect(),
            Err(_) => defaults.follow_args,
        };
        let include_stderr = match env::var("LOG_SOURCE_INCLUDE_STDERR") {
            Ok(raw) => parse_bool("LOG_SOURCE_INCLUDE_STDERR", &raw)?,
            Err(_) => defaults.include_stderr,
        };
        let config = Self {
            command: env::var("LOG_SOURCE_COMMAND").unwrap_or(defaults.command),
            follow_args,
            container: env::var("LOG_SOURCE_CONTAINER").unwrap_or(defaults.container),
            include_stderr,
        };
        if config.command.trim().is_empty() {
            bail!("LOG_SOURCE_COMMAND must not be empty");
        }
        Ok(config)
    }

    /// Full argument list passed to `command`
    pub fn args(&self) -> Vec<String> {
        let mut args = self.follow_args.clone();
        if !self.container.is_empty() {
            args.push(self.container.clone());
        }
        args
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("Invalid {}: {}. Must be 'true' or 'false'", name, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_line() {
        let config = LogSourceEnvConfig::default();
        assert_eq!(config.command, "docker");
        assert_eq!(config.args(), vec!["logs", "-f", "elixir"]);
        assert!(!config.include_stderr);
    }

    #[test]
    fn test_empty_container_is_omitted() {
        let config = LogSourceEnvConfig {
            command: "journalctl".to_string(),
            follow_args: vec!["-f".to_string(), "-u".to_string(), "elixir".to_string()],
            container: String::new(),
            include_stderr: false,
        };
        assert_eq!(config.args(), vec!["-f", "-u", "elixir"]);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
