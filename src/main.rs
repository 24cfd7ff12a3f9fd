use clap::Parser;
use csi_driver_registrar::app;
use csi_driver_registrar::cli::{Cli, LogFormat};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "csi_driver_registrar=info,warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // --version and --help exit here with status 0
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    // The loop never ends on its own, so even a clean shutdown is a failure exit.
    match app::run(cli).await {
        Ok(()) => tracing::info!("Deregistered, exiting"),
        Err(e) => tracing::error!("{:#}", e),
    }
    ExitCode::FAILURE
}
