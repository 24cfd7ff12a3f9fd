use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_CSI_ADDRESS: &str = "/run/csi/socket";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Registers a CSI driver with the cluster by maintaining its CSIDriver object.
#[derive(Debug, Parser)]
#[command(name = "csi-driver-registrar", version)]
pub struct Cli {
    /// Address of the CSI driver socket (unix:///path, /path or host:port)
    #[arg(long, env = "CSI_ADDRESS", default_value = DEFAULT_CSI_ADDRESS)]
    pub csi_address: String,

    /// Absolute path to the kubeconfig file. Required only when running out of cluster.
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// The driver requires pod information (name, namespace, uid, ...) as volume
    /// attributes during NodePublishVolume
    #[arg(
        long = "pod-info-mount",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub pod_info_on_mount: bool,

    /// Deprecated, has no effect
    #[arg(long, value_name = "DURATION", hide = true)]
    pub connection_timeout: Option<String>,

    /// Optional file with timing settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Set when the deprecated `--connection-timeout` carries a non-zero value.
    pub fn uses_deprecated_connection_timeout(&self) -> bool {
        self.connection_timeout
            .as_deref()
            .is_some_and(|value| value.chars().any(|c| c.is_ascii_digit() && c != '0'))
    }
}
