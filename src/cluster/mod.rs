pub mod client;
pub mod crd;
pub mod discovery;
pub mod registry;

pub use client::{build_client, build_config};
pub use discovery::{SchemaVariant, detect_schema_variant};
#[cfg(any(test, feature = "mockall"))]
pub use registry::MockDriverRegistry;
pub use registry::{DriverRegistry, LegacyRegistry, StableRegistry, make_add_remove};
