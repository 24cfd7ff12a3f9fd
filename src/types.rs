use serde::{Deserialize, Serialize};

/// Desired state of the cluster-side driver object.
///
/// Built once from the plugin's answers at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRegistration {
    pub name: String,
    pub attach_required: bool,
    pub pod_info_on_mount: bool,
}

impl DriverRegistration {
    pub fn new(name: impl Into<String>, attach_required: bool, pod_info_on_mount: bool) -> Self {
        Self { name: name.into(), attach_required, pod_info_on_mount }
    }
}
