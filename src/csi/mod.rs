pub mod connection;
pub mod prober;

pub use connection::{CsiEndpoint, connect};
pub use prober::{get_driver_name, is_attach_required, probe_driver};

// Re-export generated proto types
pub mod proto {
    tonic::include_proto!("csi.v1");
}
