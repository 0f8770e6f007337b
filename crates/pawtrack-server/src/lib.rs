//! pawtrack-server: HTTP service around the anomaly detector.

pub mod api;
pub mod config;
pub mod metrics;
pub mod shard;
