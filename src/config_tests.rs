use crate::config::{Config, SourceMode};
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

const VARS: &[&str] = &[
    "LOG_SOURCE",
    "LOG_SOURCE_COMMAND",
    "LOG_SOURCE_CONTAINER",
    "LOG_SOURCE_FOLLOW_ARGS",
    "LOG_SOURCE_INCLUDE_STDERR",
    "EXPORTER_PORT",
    "EXPORTER_BIND_ADDRESS",
    "METRICS_NAMESPACE",
];

fn clear_env() {
    for var in VARS {
        // SAFETY: serialised by ENV_LOCK; no other test thread touches these variables
        unsafe { env::remove_var(var) };
    }
}

fn set_env(key: &str, value: &str) {
    // SAFETY: serialised by ENV_LOCK
    unsafe { env::set_var(key, value) };
}

#[test]
fn test_config_defaults() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    let config = Config::from_env().unwrap();

    assert_eq!(config.source_mode, SourceMode::Process);
    assert_eq!(config.log_source.command, "docker");
    assert_eq!(config.log_source.args(), vec!["logs", "-f", "elixir"]);
    assert!(!config.log_source.include_stderr);
    assert_eq!(config.observability.port, 8086);
    assert!(config.observability.namespace.is_none());
}

#[test]
fn test_config_overrides() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();
    set_env("LOG_SOURCE", "stdin");
    set_env("LOG_SOURCE_CONTAINER", "validator-1");
    set_env("LOG_SOURCE_FOLLOW_ARGS", "logs --follow --tail 0");
    set_env("LOG_SOURCE_INCLUDE_STDERR", "true");
    set_env("EXPORTER_PORT", "9200");
    set_env("METRICS_NAMESPACE", "elixir");

    let config = Config::from_env().unwrap();

    assert_eq!(config.source_mode, SourceMode::Stdin);
    assert_eq!(
        config.log_source.args(),
        vec!["logs", "--follow", "--tail", "0", "validator-1"]
    );
    assert!(config.log_source.include_stderr);
    assert_eq!(config.observability.listen_address(), "0.0.0.0:9200");
    assert_eq!(config.observability.namespace.as_deref(), Some("elixir"));

    clear_env();
}

#[test]
fn test_config_rejects_invalid_values() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    set_env("EXPORTER_PORT", "not-a-port");
    assert!(Config::from_env().is_err());
    clear_env();

    set_env("LOG_SOURCE", "syslog");
    assert!(Config::from_env().is_err());
    clear_env();

    set_env("LOG_SOURCE_INCLUDE_STDERR", "sometimes");
    assert!(Config::from_env().is_err());
    clear_env();
}
