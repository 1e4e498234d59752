// Log line classification and extraction rules
pub mod classifier;

// Sequential intake loop
pub mod ingest;

// Service bootstrap
pub mod system;
