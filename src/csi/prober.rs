use crate::csi::proto::{
    ControllerGetCapabilitiesRequest, ControllerServiceCapability, GetPluginInfoRequest,
    controller_client::ControllerClient, controller_service_capability,
    identity_client::IdentityClient,
};
use crate::error::ProbeError;
use crate::types::DriverRegistration;
use std::future::Future;
use std::time::Duration;
use tonic::transport::Channel;

use controller_service_capability::rpc::Type as RpcType;

/// Asks the plugin for its name via `GetPluginInfo`.
pub async fn get_driver_name(channel: Channel, timeout: Duration) -> Result<String, ProbeError> {
    let mut client = IdentityClient::new(channel);
    let info = with_deadline("GetPluginInfo", timeout, async move {
        client.get_plugin_info(GetPluginInfoRequest {}).await
    })
    .await?;

    if info.name.is_empty() {
        return Err(ProbeError::EmptyDriverName);
    }
    Ok(info.name)
}

/// True when the plugin advertises `PUBLISH_UNPUBLISH_VOLUME`, i.e. volumes
/// need a controller-side attach before the node can mount them.
pub async fn is_attach_required(channel: Channel, timeout: Duration) -> Result<bool, ProbeError> {
    let mut client = ControllerClient::new(channel);
    let response = with_deadline("ControllerGetCapabilities", timeout, async move {
        client.controller_get_capabilities(ControllerGetCapabilitiesRequest {}).await
    })
    .await?;

    Ok(has_rpc_capability(&response.capabilities, RpcType::PublishUnpublishVolume))
}

/// Queries everything the registration needs from the plugin.
pub async fn probe_driver(
    channel: Channel,
    timeout: Duration,
    pod_info_on_mount: bool,
) -> Result<DriverRegistration, ProbeError> {
    tracing::debug!("Calling CSI driver to discover driver name");
    let name = get_driver_name(channel.clone(), timeout).await?;
    tracing::info!(driver = %name, "CSI driver name discovered");

    tracing::debug!("Checking if CSI driver implements ControllerPublishVolume()");
    let attach_required = is_attach_required(channel, timeout).await?;
    tracing::info!(driver = %name, attach_required, "CSI driver capabilities discovered");

    Ok(DriverRegistration::new(name, attach_required, pod_info_on_mount))
}

/// Entries that are not RPC capabilities are skipped.
pub fn has_rpc_capability(capabilities: &[ControllerServiceCapability], wanted: RpcType) -> bool {
    capabilities.iter().any(|cap| match &cap.r#type {
        Some(controller_service_capability::Type::Rpc(rpc)) => rpc.r#type == wanted as i32,
        None => false,
    })
}

async fn with_deadline<T, F>(call: &'static str, timeout: Duration, fut: F) -> Result<T, ProbeError>
where
    F: Future<Output = Result<tonic::Response<T>, tonic::Status>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(response)) => Ok(response.into_inner()),
        Ok(Err(status)) if status.code() == tonic::Code::DeadlineExceeded => {
            Err(ProbeError::Timeout { call, timeout_ms: timeout.as_millis() })
        }
        Ok(Err(status)) => Err(ProbeError::Rpc { call, status }),
        Err(_) => Err(ProbeError::Timeout { call, timeout_ms: timeout.as_millis() }),
    }
}
