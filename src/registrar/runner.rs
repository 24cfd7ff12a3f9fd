use crate::cluster::DriverRegistry;
use crate::error::RegistryError;
use crate::registrar::retry::{Backoff, retry_on_conflict};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::time::MissedTickBehavior;

/// Keeps the driver object present until told to stop, then removes it.
pub struct Registrar {
    name: String,
    registry: Arc<dyn DriverRegistry>,
    interval: Duration,
    backoff: Backoff,
}

impl Registrar {
    pub fn new(
        name: impl Into<String>,
        registry: Arc<dyn DriverRegistry>,
        interval: Duration,
        backoff: Backoff,
    ) -> Self {
        Self { name: name.into(), registry, interval, backoff }
    }

    /// Creates the driver object. An object that already exists counts as
    /// success.
    pub async fn verify_and_add(&self) -> Result<(), RegistryError> {
        retry_on_conflict(&self.backoff, || async {
            match self.registry.add().await {
                Ok(()) => {
                    tracing::info!(driver = %self.name, "CSIDriver object created");
                    Ok(())
                }
                Err(e) if e.is_already_exists() => {
                    tracing::debug!(driver = %self.name, "CSIDriver object already registered");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(
                        driver = %self.name,
                        error = %e,
                        "Failed to create CSIDriver object"
                    );
                    Err(e)
                }
            }
        })
        .await
    }

    /// Deletes the driver object. An object that is already gone counts as
    /// success.
    pub async fn verify_and_delete(&self) -> Result<(), RegistryError> {
        retry_on_conflict(&self.backoff, || async {
            match self.registry.remove().await {
                Ok(()) => {
                    tracing::info!(driver = %self.name, "CSIDriver object deleted");
                    Ok(())
                }
                Err(e) if e.is_not_found() => {
                    tracing::info!(
                        driver = %self.name,
                        "No need to clean up CSIDriver since it does not exist"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(
                        driver = %self.name,
                        error = %e,
                        "Failed to delete CSIDriver object"
                    );
                    Err(e)
                }
            }
        })
        .await
    }

    /// Registers every interval until `shutdown` resolves, then deregisters
    /// once and returns. A registration still in flight when `shutdown` fires is
    /// abandoned.
    pub async fn run<S>(&self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        // Failures were logged; the next tick retries.
                        _ = self.verify_and_add() => {}
                        _ = &mut shutdown => {
                            tracing::debug!(
                                driver = %self.name,
                                "Abandoning registration in flight"
                            );
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!(driver = %self.name, "Termination requested, deregistering");
        // Best effort, the process exits either way.
        let _ = self.verify_and_delete().await;
    }
}

/// Resolves on the first SIGINT or SIGTERM.
///
/// Handlers are installed before this returns so a signal delivered while the
/// first registration is in flight is not lost.
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => tracing::info!("Received SIGINT"),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
        }
    })
}
