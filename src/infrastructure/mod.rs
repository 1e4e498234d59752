pub mod log_source;
pub mod mock;
pub mod observability;
