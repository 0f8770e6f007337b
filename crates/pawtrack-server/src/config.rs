//! Server configuration from the command line

use clap::Parser;
use pawtrack_core::{ConfigError, DetectorConfig, RegistryConfig};
use std::path::PathBuf;

use crate::shard::ShardSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "pawtrack-server")]
#[command(about = "Health-metric anomaly detection service")]
pub struct ServerConfig {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Number of shard workers (defaults to available parallelism)
    #[arg(long)]
    pub shards: Option<usize>,

    /// Cached alert sets kept per shard before eviction
    #[arg(long, default_value_t = 100_000)]
    pub max_subjects_per_shard: usize,

    /// Pending commands per shard before requests are rejected
    #[arg(long, default_value_t = 10_000)]
    pub queue_depth: usize,

    /// UTC offset used to decide which calendar day is "today"
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub utc_offset_minutes: i32,

    /// JSON file overriding detector thresholds
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            shards: None,
            max_subjects_per_shard: 100_000,
            queue_depth: 10_000,
            utc_offset_minutes: 0,
            config: None,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shard_count(&self) -> usize {
        self.shards.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(8)
        })
    }

    pub fn detector_config(&self) -> Result<DetectorConfig, ConfigError> {
        match &self.config {
            Some(path) => DetectorConfig::from_json_file(path),
            None => Ok(DetectorConfig::default()),
        }
    }

    pub fn shard_settings(&self) -> Result<ShardSettings, ConfigError> {
        Ok(ShardSettings {
            detector: self.detector_config()?,
            registry: RegistryConfig {
                max_subjects: self.max_subjects_per_shard,
            },
            utc_offset_minutes: self.utc_offset_minutes,
            queue_depth: self.queue_depth,
            fixed_clock: None,
        })
    }
}
