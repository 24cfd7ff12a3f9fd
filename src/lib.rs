//! Sidecar that advertises a CSI driver to Kubernetes.
//!
//! The driver's name and attach requirement are read from the plugin once at
//! startup. A `CSIDriver` object carrying them is then kept present in the
//! cluster and removed again when the process is told to terminate.

pub mod app;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod csi;
pub mod error;
pub mod registrar;
pub mod types;

pub use error::{ProbeError, RegistrarError, RegistryError};
pub use types::DriverRegistration;
