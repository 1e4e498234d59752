//! Producers of the monitored process's log lines

pub mod process;
pub mod reader;

pub use process::ProcessLogSource;
pub use reader::ReaderLogSource;
