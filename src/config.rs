use clap::Parser;

use std::path::PathBuf;
use std::time::Duration;

use crate::sampler::MonitorConfig;

#[derive(Debug, Parser)]
#[command(name = "gpu-temp-logger")]
#[command(about = "GPU Temperature Logger", long_about = None)]
pub struct Config {
    /// Path to the SQLite database file
    #[arg(long, env = "GPU_TEMP_DB_FILE", default_value = "gpu_temperatures.db")]
    pub db_file: PathBuf,

    /// Query recent temperature readings instead of logging
    #[arg(long, conflicts_with = "monitor")]
    pub query: bool,

    /// Number of recent readings to display when querying
    #[arg(long, env = "GPU_TEMP_QUERY_LIMIT", default_value_t = 10)]
    pub limit: usize,

    /// Monitor temperature at specified intervals
    #[arg(long)]
    pub monitor: bool,

    /// Time between measurements in milliseconds
    #[arg(
        long,
        env = "GPU_TEMP_INTERVAL_MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Total monitoring duration in seconds
    #[arg(long, env = "GPU_TEMP_DURATION_SECS", default_value_t = 60)]
    pub duration: u64,

    /// Diagnostic tool queried for the GPU temperature
    #[arg(long, env = "GPU_TEMP_SENSOR_COMMAND", default_value = "nvidia-smi")]
    pub sensor_command: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    LogOnce,
    Query { limit: usize },
    Monitor(MonitorConfig),
}

impl Config {
    pub fn mode(&self) -> Mode {
        if self.query {
            Mode::Query { limit: self.limit }
        } else if self.monitor {
            Mode::Monitor(MonitorConfig {
                interval: Duration::from_millis(self.interval),
                duration: Duration::from_secs(self.duration),
            })
        } else {
            Mode::LogOnce
        }
    }
}
