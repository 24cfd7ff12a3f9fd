// Shared fixtures for the integration tests: a fake CSI plugin served on a
// Unix socket and a wiremock server standing in for the Kubernetes API.
#![allow(dead_code)]

use csi_driver_registrar::csi::proto::controller_server::{Controller, ControllerServer};
use csi_driver_registrar::csi::proto::controller_service_capability::{self, Rpc, rpc::Type};
use csi_driver_registrar::csi::proto::identity_server::{Identity, IdentityServer};
use csi_driver_registrar::csi::proto::*;
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone)]
pub struct FakePlugin {
    pub name: String,
    pub capabilities: Vec<Type>,
    pub info_delay: Duration,
}

impl FakePlugin {
    pub fn new(name: &str, capabilities: Vec<Type>) -> Self {
        Self { name: name.to_string(), capabilities, info_delay: Duration::ZERO }
    }
}

#[tonic::async_trait]
impl Identity for FakePlugin {
    async fn get_plugin_info(
        &self,
        _request: Request<GetPluginInfoRequest>,
    ) -> Result<Response<GetPluginInfoResponse>, Status> {
        tokio::time::sleep(self.info_delay).await;
        Ok(Response::new(GetPluginInfoResponse {
            name: self.name.clone(),
            vendor_version: "1.0.0".to_string(),
            manifest: Default::default(),
        }))
    }
}

#[tonic::async_trait]
impl Controller for FakePlugin {
    async fn controller_get_capabilities(
        &self,
        _request: Request<ControllerGetCapabilitiesRequest>,
    ) -> Result<Response<ControllerGetCapabilitiesResponse>, Status> {
        let capabilities = self
            .capabilities
            .iter()
            .map(|t| ControllerServiceCapability {
                r#type: Some(controller_service_capability::Type::Rpc(Rpc { r#type: *t as i32 })),
            })
            .collect();

        Ok(Response::new(ControllerGetCapabilitiesResponse { capabilities }))
    }
}

/// Serves the plugin on a fresh socket. The returned dir must outlive the test.
pub fn serve_plugin(plugin: FakePlugin, with_controller: bool) -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("csi.sock");
    let uds = UnixListener::bind(&socket).unwrap();
    let incoming = UnixListenerStream::new(uds);

    let mut router = Server::builder().add_service(IdentityServer::new(plugin.clone()));
    if with_controller {
        router = router.add_service(ControllerServer::new(plugin));
    }
    tokio::spawn(router.serve_with_incoming(incoming));

    (dir, format!("unix://{}", socket.display()))
}

/// Kubeconfig pointing at the mock API server.
pub fn kubeconfig_for(server: &MockServer) -> NamedTempFile {
    let kubeconfig = format!(
        r#"
apiVersion: v1
kind: Config
clusters:
- name: mock
  cluster:
    server: {}
users:
- name: registrar
  user:
    token: test-token
contexts:
- name: mock
  context:
    cluster: mock
    user: registrar
current-context: mock
"#,
        server.uri()
    );
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(kubeconfig.as_bytes()).unwrap();
    file
}

pub fn resource_list(group_version: &str, kinds: &[(&str, &str)]) -> serde_json::Value {
    let resources: Vec<_> = kinds
        .iter()
        .map(|(name, kind)| {
            json!({
                "name": name,
                "singularName": "",
                "namespaced": false,
                "kind": kind,
                "verbs": ["create", "delete", "get", "list"],
            })
        })
        .collect();

    json!({
        "kind": "APIResourceList",
        "apiVersion": "v1",
        "groupVersion": group_version,
        "resources": resources,
    })
}

pub fn status(code: u16, reason: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(code).set_body_json(json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code,
    }))
}

pub fn driver_object(api_version: &str, name: &str) -> serde_json::Value {
    json!({
        "apiVersion": api_version,
        "kind": "CSIDriver",
        "metadata": { "name": name },
        "spec": { "attachRequired": false },
    })
}

pub async fn serve_group(server: &MockServer, group_version: &str, kinds: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path(format!("/apis/{group_version}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(resource_list(group_version, kinds)))
        .mount(server)
        .await;
}

pub async fn missing_group(server: &MockServer, group_version: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/apis/{group_version}")))
        .respond_with(status(404, "NotFound", "the server could not find the requested resource"))
        .mount(server)
        .await;
}

/// Number of requests the mock API server saw with the given method.
pub async fn count_requests(server: &MockServer, verb: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == verb)
        .count()
}
