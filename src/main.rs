mod config;
mod job;

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::RunConfig;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match RunConfig::from_env().and_then(|config| job::run(&config)) {
        Ok(report) => {
            info!(
                filter = %report.filter,
                bands = report.bands.len(),
                elapsed_ms = report.elapsed.as_millis(),
                "image processed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
