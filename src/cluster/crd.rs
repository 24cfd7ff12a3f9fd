use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// The only `podInfoOnMountVersion` the alpha API ever defined.
pub const POD_INFO_ON_MOUNT_VERSION: &str = "v1";

/// Pre-GA, CRD-backed CSIDriver (`csi.storage.k8s.io/v1alpha1`), served by
/// clusters that predate `storage.k8s.io` CSIDriver.
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[kube(
    group = "csi.storage.k8s.io",
    version = "v1alpha1",
    kind = "CSIDriver",
    plural = "csidrivers",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct CSIDriverSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attach_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_info_on_mount_version: Option<String>,
}
