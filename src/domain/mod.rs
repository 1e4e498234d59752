// Facts extracted from log lines
pub mod log_event;

// Metric kinds and catalogue
pub mod metrics;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
