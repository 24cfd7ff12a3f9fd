use crate::error::{RegistrarError, RegistrarResult};
use hyper_util::rt::TokioIo;
use std::path::PathBuf;
use tokio::net::UnixStream;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;

/// Where the plugin listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsiEndpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl CsiEndpoint {
    /// Accepts `unix:///path`, a bare absolute path, or `host:port`.
    pub fn parse(address: &str) -> RegistrarResult<Self> {
        if let Some(path) = address.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(RegistrarError::InvalidAddress(address.to_string()));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        if address.starts_with('/') {
            return Ok(Self::Unix(PathBuf::from(address)));
        }
        if address.is_empty() || address.contains("://") {
            return Err(RegistrarError::InvalidAddress(address.to_string()));
        }
        Ok(Self::Tcp(address.to_string()))
    }
}

/// Opens the single long-lived channel to the plugin.
///
/// The connection is established eagerly so an unreachable socket fails
/// startup instead of the first probe.
pub async fn connect(address: &str) -> RegistrarResult<Channel> {
    tracing::debug!("Attempting to open a gRPC connection with: {:?}", address);

    let conn_err =
        |source| RegistrarError::Connection { address: address.to_string(), source };

    let channel = match CsiEndpoint::parse(address)? {
        CsiEndpoint::Unix(path) => {
            // The URI is ignored by the connector; tonic just needs a valid one.
            Endpoint::from_static("http://[::]:50051")
                .connect_with_connector(service_fn(move |_: Uri| {
                    let path = path.clone();
                    async move {
                        Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(path).await?))
                    }
                }))
                .await
                .map_err(conn_err)?
        }
        CsiEndpoint::Tcp(authority) => Endpoint::from_shared(format!("http://{authority}"))
            .map_err(conn_err)?
            .connect()
            .await
            .map_err(conn_err)?,
    };

    tracing::info!(address, "Connected to CSI driver");
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unix_scheme() {
        assert_eq!(
            CsiEndpoint::parse("unix:///run/csi/socket").unwrap(),
            CsiEndpoint::Unix(PathBuf::from("/run/csi/socket"))
        );
    }

    #[test]
    fn test_parse_bare_path() {
        assert_eq!(
            CsiEndpoint::parse("/csi/csi.sock").unwrap(),
            CsiEndpoint::Unix(PathBuf::from("/csi/csi.sock"))
        );
    }

    #[test]
    fn test_parse_tcp() {
        assert_eq!(
            CsiEndpoint::parse("127.0.0.1:10000").unwrap(),
            CsiEndpoint::Tcp("127.0.0.1:10000".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CsiEndpoint::parse("").is_err());
        assert!(CsiEndpoint::parse("unix://").is_err());
        assert!(CsiEndpoint::parse("http://host:1").is_err());
    }

    #[tokio::test]
    async fn test_connect_missing_socket_fails() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("absent.sock");

        let result = connect(&format!("unix://{}", socket.display())).await;
        assert!(matches!(result, Err(RegistrarError::Connection { .. })));
    }
}
