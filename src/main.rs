use clap::Parser;
use squidviz::cli::{self, Cli};
use squidviz::config::SquidVizConfig;
use squidviz::telemetry::init_telemetry;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_telemetry(cli.log_json) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }
    if let Err(e) = SquidVizConfig::load_env_file() {
        tracing::warn!("Failed to load .env file: {e:#}");
    }

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(cli::run(cli)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
