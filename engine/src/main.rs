//! Troupe binary entry point

use clap::Parser;
use troupe_engine::cli::Cli;
use troupe_engine::config::Config;
use troupe_engine::error::ErrorExt;
use troupe_engine::handlers;
use troupe_engine::telemetry;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // CLI flag beats config file; RUST_LOG beats both inside telemetry.
    let log_level = cli
        .log
        .clone()
        .unwrap_or_else(|| config.core.log_level.clone());
    telemetry::init_telemetry_with_level(&log_level);

    if let Err(e) = handlers::dispatch(cli.command, config, cli.json).await {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        eprintln!("Hint: {}", e.user_hint());
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> troupe_engine::error::Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load_or_create(),
    }
}
