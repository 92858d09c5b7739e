mod config;
mod gui;
mod layout;
mod network;
mod params;
mod topology;

use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;

use config::Config;
use gui::app;

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("ui error: {0}")]
    Ui(#[from] eframe::Error),
}

fn run(config: Config) -> Result<(), AppError> {
    let rt = Arc::new(tokio::runtime::Runtime::new()?);
    app::main(rt, config)?;
    Ok(())
}

fn main() {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if let Err(e) = run(config) {
        error!("{}", e);
        std::process::exit(1);
    }
}
