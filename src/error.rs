use thiserror::Error;

pub type RegistrarResult<T> = Result<T, RegistrarError>;

/// Startup failures. Every variant is fatal: the process exits with status 1.
#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("error connecting to CSI driver at {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("invalid CSI address {0:?}")]
    InvalidAddress(String),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("failed to build cluster client config: {0}")]
    Config(String),

    #[error("failed to query server resources for {group_version}: {source}")]
    Discovery {
        group_version: String,
        #[source]
        source: kube::Error,
    },

    #[error(
        "not compatible with this Kubernetes cluster, need support for CSIDriver in one of the following APIs: {}",
        .0.join(", ")
    )]
    UnsupportedCluster(Vec<String>),

    #[error("invalid settings: {0}")]
    Settings(String),
}

/// Failures of the one-shot plugin queries made at startup.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{call} timed out after {timeout_ms}ms")]
    Timeout { call: &'static str, timeout_ms: u128 },

    #[error("{call} failed: {status}")]
    Rpc {
        call: &'static str,
        #[source]
        status: tonic::Status,
    },

    #[error("driver name is empty")]
    EmptyDriverName,
}

/// Outcome of a single create or delete of the registry object.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("CSIDriver {0} already exists")]
    AlreadyExists(String),

    #[error("CSIDriver {0} not found")]
    NotFound(String),

    #[error("conflict writing CSIDriver {0}")]
    Conflict(String),

    #[error("API error {code} ({reason}): {message}")]
    Api { code: u16, reason: String, message: String },

    #[error("request failed: {0}")]
    Transport(String),
}

impl RegistryError {
    /// Classifies a client error for the driver object `name`.
    pub fn from_kube(name: &str, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(status) => {
                Self::from_status(name, status.code, &status.reason, &status.message)
            }
            other => Self::Transport(other.to_string()),
        }
    }

    /// Maps an API status onto the taxonomy. Both AlreadyExists and Conflict
    /// are reported as HTTP 409 and only differ by reason.
    pub fn from_status(name: &str, code: u16, reason: &str, message: &str) -> Self {
        match (code, reason) {
            (409, "AlreadyExists") => Self::AlreadyExists(name.to_string()),
            (409, "Conflict") => Self::Conflict(name.to_string()),
            (404, _) => Self::NotFound(name.to_string()),
            _ => Self::Api { code, reason: reason.to_string(), message: message.to_string() },
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
