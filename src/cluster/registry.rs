use crate::cluster::crd::{self, POD_INFO_ON_MOUNT_VERSION};
use crate::cluster::discovery::SchemaVariant;
use crate::error::RegistryError;
use crate::types::DriverRegistration;
use async_trait::async_trait;
use k8s_openapi::api::storage::v1::{CSIDriver, CSIDriverSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client};
#[cfg(any(test, feature = "mockall"))]
use mockall::automock;
use std::sync::Arc;

/// Create and delete of this driver's registry object, bound to one API.
#[cfg_attr(any(test, feature = "mockall"), automock)]
#[async_trait]
pub trait DriverRegistry: Send + Sync {
    async fn add(&self) -> Result<(), RegistryError>;
    async fn remove(&self) -> Result<(), RegistryError>;
}

/// `storage.k8s.io/v1` CSIDriver.
pub struct StableRegistry {
    api: Api<CSIDriver>,
    name: String,
    object: CSIDriver,
}

impl StableRegistry {
    pub fn new(client: Client, registration: &DriverRegistration) -> Self {
        Self {
            api: Api::all(client),
            name: registration.name.clone(),
            object: stable_object(registration),
        }
    }
}

#[async_trait]
impl DriverRegistry for StableRegistry {
    async fn add(&self) -> Result<(), RegistryError> {
        self.api
            .create(&PostParams::default(), &self.object)
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::from_kube(&self.name, e))
    }

    async fn remove(&self) -> Result<(), RegistryError> {
        self.api
            .delete(&self.name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::from_kube(&self.name, e))
    }
}

/// `csi.storage.k8s.io/v1alpha1` CSIDriver.
pub struct LegacyRegistry {
    api: Api<crd::CSIDriver>,
    name: String,
    object: crd::CSIDriver,
}

impl LegacyRegistry {
    pub fn new(client: Client, registration: &DriverRegistration) -> Self {
        Self {
            api: Api::all(client),
            name: registration.name.clone(),
            object: legacy_object(registration),
        }
    }
}

#[async_trait]
impl DriverRegistry for LegacyRegistry {
    async fn add(&self) -> Result<(), RegistryError> {
        self.api
            .create(&PostParams::default(), &self.object)
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::from_kube(&self.name, e))
    }

    async fn remove(&self) -> Result<(), RegistryError> {
        self.api
            .delete(&self.name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::from_kube(&self.name, e))
    }
}

/// Binds create/delete to the variant chosen at startup so the registrar
/// never has to look at the variant again.
pub fn make_add_remove(
    variant: SchemaVariant,
    client: Client,
    registration: &DriverRegistration,
) -> Arc<dyn DriverRegistry> {
    match variant {
        SchemaVariant::Stable => {
            let registry = StableRegistry::new(client, registration);
            tracing::debug!(api = %variant, object = ?registry.object, "CSIDriver object");
            Arc::new(registry)
        }
        SchemaVariant::Legacy => {
            let registry = LegacyRegistry::new(client, registration);
            tracing::debug!(api = %variant, object = ?registry.object, "CSIDriver object");
            Arc::new(registry)
        }
    }
}

pub fn stable_object(registration: &DriverRegistration) -> CSIDriver {
    CSIDriver {
        metadata: ObjectMeta { name: Some(registration.name.clone()), ..Default::default() },
        spec: CSIDriverSpec {
            attach_required: Some(registration.attach_required),
            pod_info_on_mount: Some(registration.pod_info_on_mount),
            ..Default::default()
        },
    }
}

/// The alpha API has no boolean; pod info is requested by naming a version.
pub fn legacy_object(registration: &DriverRegistration) -> crd::CSIDriver {
    crd::CSIDriver::new(
        &registration.name,
        crd::CSIDriverSpec {
            attach_required: Some(registration.attach_required),
            pod_info_on_mount_version: registration
                .pod_info_on_mount
                .then(|| POD_INFO_ON_MOUNT_VERSION.to_string()),
        },
    )
}
