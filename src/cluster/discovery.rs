use crate::error::{RegistrarError, RegistrarResult};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::Client;
use std::fmt;

pub const STABLE_GROUP_VERSION: &str = "storage.k8s.io/v1";
pub const LEGACY_GROUP_VERSION: &str = "csi.storage.k8s.io/v1alpha1";
pub const CSI_DRIVER_KIND: &str = "CSIDriver";

/// Which CSIDriver API the connected cluster serves. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    /// `storage.k8s.io/v1`
    Stable,
    /// `csi.storage.k8s.io/v1alpha1`, CRD based
    Legacy,
}

impl SchemaVariant {
    pub fn group_version(self) -> &'static str {
        match self {
            Self::Stable => STABLE_GROUP_VERSION,
            Self::Legacy => LEGACY_GROUP_VERSION,
        }
    }

    /// Picks from already-discovered resource lists; stable wins over legacy.
    pub fn select(resources: &[APIResourceList]) -> RegistrarResult<Self> {
        [Self::Stable, Self::Legacy]
            .into_iter()
            .find(|variant| has_resource(resources, variant.group_version(), CSI_DRIVER_KIND))
            .ok_or_else(|| {
                RegistrarError::UnsupportedCluster(vec![
                    STABLE_GROUP_VERSION.to_string(),
                    LEGACY_GROUP_VERSION.to_string(),
                ])
            })
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group_version())
    }
}

pub fn has_resource(resources: &[APIResourceList], group_version: &str, kind: &str) -> bool {
    resources
        .iter()
        .filter(|list| list.group_version == group_version)
        .any(|list| list.resources.iter().any(|r| r.kind == kind))
}

/// Asks the API server for the candidate group versions in order of
/// preference and stops at the first one that serves `CSIDriver`.
///
/// A group version the server does not know answers 404 and is skipped; any
/// other failure on a group version that still had to be looked at is
/// surfaced.
pub async fn detect_schema_variant(client: &Client) -> RegistrarResult<SchemaVariant> {
    let mut found = Vec::new();
    for group_version in [STABLE_GROUP_VERSION, LEGACY_GROUP_VERSION] {
        match client.list_api_group_resources(group_version).await {
            Ok(list) => found.push(list),
            Err(kube::Error::Api(status)) if status.code == 404 => {
                tracing::debug!(group_version, "API group version not served");
                continue;
            }
            Err(source) => {
                return Err(RegistrarError::Discovery {
                    group_version: group_version.to_string(),
                    source,
                });
            }
        }

        if let Ok(variant) = SchemaVariant::select(&found) {
            tracing::info!(api = %variant, "Selected CSIDriver API");
            return Ok(variant);
        }
    }
    SchemaVariant::select(&found)
}
