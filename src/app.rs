use crate::cli::Cli;
use crate::cluster::{build_client, detect_schema_variant, make_add_remove};
use crate::config::Settings;
use crate::csi::{connect, probe_driver};
use crate::registrar::{Backoff, Registrar, shutdown_signal};
use anyhow::{Context, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Startup sequence followed by the registration loop.
///
/// Returns only after a termination signal was handled; every startup failure
/// is returned as an error before anything is written to the cluster.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("Version: {}", VERSION);

    if cli.uses_deprecated_connection_timeout() {
        tracing::warn!("--connection-timeout is deprecated and will have no effect");
    }

    let settings = Settings::load(cli.config.as_deref())?;

    let channel = connect(&cli.csi_address).await?;
    let registration = probe_driver(channel, settings.csi_timeout(), cli.pod_info_on_mount)
        .await
        .context("error querying CSI driver")?;

    tracing::debug!("Loading kubeconfig");
    let client = build_client(cli.kubeconfig.as_deref()).await?;
    let variant = detect_schema_variant(&client).await?;
    let registry = make_add_remove(variant, client, &registration);

    let shutdown = shutdown_signal().context("failed to install signal handlers")?;
    let registrar = Registrar::new(
        registration.name,
        registry,
        settings.registration_interval(),
        Backoff::from(&settings.retry),
    );
    registrar.run(shutdown).await;

    Ok(())
}
