//! Log processing for hostscope
//!
//! This crate provides line classification, frequency aggregation and
//! whole-file ingestion for the firewall, auth and fail2ban logs.

mod aggregator;
mod classifier;
mod ingest;

pub use aggregator::Aggregator;
pub use classifier::LineClassifier;
pub use ingest::{collect, ingest_file, IngestError, LogSources};

// Re-export types used in our public API
pub use hostscope_types::{AggregatedSnapshot, Category, FrequencyTable, LogEvent, LogKind};
