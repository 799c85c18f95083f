//! Wide month supplier metrics - SQLite → DataFusion → partitioned CSV.
//!
//! This library provides the pipeline stages: source binding, the transform
//! query, and the CSV sink, plus the run driver that ties them together.

pub mod config;
pub mod engine;
pub mod job;
pub mod sink;
pub mod source;
pub mod transform;
