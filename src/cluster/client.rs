use crate::error::{RegistrarError, RegistrarResult};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::Path;

/// Uses the kubeconfig at `kubeconfig` when given, otherwise the service
/// account Kubernetes mounts into the pod.
pub async fn build_config(kubeconfig: Option<&Path>) -> RegistrarResult<Config> {
    match kubeconfig {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading kubeconfig");
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                RegistrarError::Config(format!("reading {}: {}", path.display(), e))
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| RegistrarError::Config(format!("loading {}: {}", path.display(), e)))
        }
        None => {
            tracing::debug!("Using in-cluster service account credentials");
            Config::incluster()
                .map_err(|e| RegistrarError::Config(format!("in-cluster config: {e}")))
        }
    }
}

pub async fn build_client(kubeconfig: Option<&Path>) -> RegistrarResult<Client> {
    let config = build_config(kubeconfig).await?;
    Client::try_from(config).map_err(|e| RegistrarError::Config(e.to_string()))
}
