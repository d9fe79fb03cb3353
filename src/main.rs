use anyhow::{Context, Result};
use clap::Parser;

use std::{io, process::ExitCode, sync::Arc};

mod config;
use config::{Config, Mode};

mod db;
use db::Store;

mod gpu_sensor;
use gpu_sensor::GpuSensor;

mod query;
mod sampler;
use sampler::StopReason;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_logging();

    let config = Config::parse();
    log::debug!("Configuration: {config:?}");

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", fatal_message(&err));
            ExitCode::FAILURE
        }
    }
}

fn fatal_message(err: &anyhow::Error) -> String {
    format!("Fatal error: {err:#}")
}

fn init_logging() {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    match std::env::var("RUST_LOG") {
        Ok(filters) => builder.parse_filters(&filters),
        Err(_) => builder.filter_level(log::LevelFilter::Info),
    };

    builder.init();
}

async fn run(config: Config) -> Result<()> {
    let store = Store::open(&config.db_file);
    store
        .ensure_schema()
        .with_context(|| format!("failed to initialise database {:?}", store.path()))?;

    let sensor = Arc::new(GpuSensor::new(&config.sensor_command));

    match config.mode() {
        Mode::LogOnce => {
            let tick = sampler::sample_once(&sensor, &store)
                .await
                .context("failed to log temperature")?;

            println!("{}", query::render_tick(&tick));
        }
        Mode::Query { limit } => {
            query::show_recent(&store, limit, io::stdout().lock())
                .context("failed to query temperatures")?;
        }
        Mode::Monitor(monitor_config) => {
            let summary = sampler::monitor(sensor, &store, monitor_config, shutdown_signal())
                .await
                .context("temperature monitoring failed")?;

            let stored = store.count().context("failed to count stored readings")?;

            match summary.stop {
                StopReason::Elapsed => log::info!(
                    "Temperature monitoring completed: {} of {} ticks captured, {stored} readings stored",
                    summary.captured,
                    summary.ticks
                ),
                StopReason::Interrupted => log::info!(
                    "Temperature monitoring stopped by user after {} ticks",
                    summary.ticks
                ),
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Unable to listen for interrupt signal: {err}");
        std::future::pending::<()>().await;
    }
}
