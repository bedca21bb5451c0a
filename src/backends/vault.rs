use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use super::secret_backend::{BackendMount, KeyListBackend, KeyListing};
use crate::config::VaultConfig;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// HashiCorp Vault client
#[derive(Clone)]
pub struct VaultClient {
    client: Client,
    address: String,
    token: String,
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VaultResponse<T> {
    data: T,
}

/// Body of `sys/internal/ui/mounts/<path>`
#[derive(Debug, Deserialize)]
struct MountInfo {
    #[serde(default)]
    path: String,
    #[serde(default)]
    options: Option<HashMap<String, Value>>,
}

impl MountInfo {
    fn is_kv_v2(&self) -> bool {
        self.options
            .as_ref()
            .and_then(|options| options.get("version"))
            .and_then(Value::as_str)
            == Some("2")
    }
}

impl VaultClient {
    /// Create a new Vault client
    pub fn new(address: String, token: String) -> Result<Self> {
        Self::build(address, token, None, DEFAULT_TIMEOUT_SECONDS)
    }

    /// Create a client from validated configuration
    pub fn from_config(config: &VaultConfig) -> Result<Self> {
        Self::build(
            config.address.clone(),
            config.token.clone(),
            config.namespace.clone(),
            config.timeout_seconds,
        )
    }

    fn build(
        address: String,
        token: String,
        namespace: Option<String>,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            address: address.trim_end_matches('/').to_string(),
            token,
            namespace,
        })
    }

    /// Send requests under an enterprise namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("X-Vault-Token", &self.token);

        match self.namespace {
            Some(ref namespace) => builder.header("X-Vault-Namespace", namespace),
            None => builder,
        }
    }

    /// Look up the mount a path lives under and its KV version.
    ///
    /// Servers without the preflight endpoint answer 404; those only ever
    /// had unversioned KV, so the path is reported as KV v1.
    pub async fn mount_info(&self, path: &str) -> Result<BackendMount> {
        let url = self.url(&format!(
            "sys/internal/ui/mounts/{}",
            path.trim_start_matches('/')
        ));
        debug!("Resolving mount from: {}", url);

        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .context("Failed to query Vault mount information")?;

        if response.status() == StatusCode::NOT_FOUND {
            info!("Mount preflight unavailable for {}, assuming KV v1", path);
            return Ok(BackendMount::unversioned(""));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Vault mount preflight failed with status {}: {}",
                status,
                body
            );
        }

        let vault_response: VaultResponse<MountInfo> = response
            .json()
            .await
            .context("Failed to parse Vault mount response")?;

        let mount = vault_response.data;
        let is_versioned = mount.is_kv_v2();
        debug!(
            "Path {} is under mount {:?} (versioned: {})",
            path, mount.path, is_versioned
        );

        Ok(BackendMount {
            mount_path: mount.path,
            is_versioned,
        })
    }

    /// List entries at a full logical path, returning the raw `data` object
    pub async fn list_path(&self, path: &str) -> Result<Option<KeyListing>> {
        let url = self.url(path);
        debug!("Listing keys at: {}", url);

        let response = self
            .request(Method::GET, &url)
            .query(&[("list", "true")])
            .send()
            .await
            .context("Failed to list keys from Vault")?;

        // 404 means nothing exists at this path
        if response.status() == StatusCode::NOT_FOUND {
            info!("No keys found at {}", path);
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Vault list request failed with status {}: {}", status, body);
        }

        #[derive(Deserialize)]
        struct ListResponse {
            #[serde(default)]
            data: Option<Map<String, Value>>,
        }

        let vault_response: ListResponse = response
            .json()
            .await
            .context("Failed to parse Vault list response")?;

        Ok(vault_response.data.map(KeyListing::new))
    }
}

#[async_trait::async_trait]
impl KeyListBackend for VaultClient {
    async fn resolve_mount(&self, path: &str) -> Result<BackendMount> {
        self.mount_info(path).await
    }

    async fn list(&self, path: &str) -> Result<Option<KeyListing>> {
        self.list_path(path).await
    }

    fn backend_type(&self) -> &'static str {
        "HashiCorp Vault"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_vault_client_new() {
        let client = VaultClient::new(
            "http://localhost:8200".to_string(),
            "test-token".to_string(),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_vault_url_construction() {
        let client = VaultClient::new(
            "http://localhost:8200/".to_string(),
            "test-token".to_string(),
        )
        .unwrap();

        assert_eq!(client.url("secret/app"), "http://localhost:8200/v1/secret/app");
        assert_eq!(client.url("/kv2/metadata/app"), "http://localhost:8200/v1/kv2/metadata/app");
    }

    #[tokio::test]
    async fn test_mount_info_detects_kv_v2() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/sys/internal/ui/mounts/kv2/app")
            .match_header("x-vault-token", "test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"path":"kv2/","type":"kv","options":{"version":"2"}}}"#)
            .create_async()
            .await;

        let client = VaultClient::new(server.url(), "test-token".to_string()).unwrap();
        let mount = client.resolve_mount("kv2/app").await.unwrap();

        mock.assert_async().await;
        assert_eq!(mount, BackendMount::versioned("kv2/"));
    }

    #[tokio::test]
    async fn test_mount_info_kv_v1_and_missing_options() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/sys/internal/ui/mounts/secret/app")
            .with_status(200)
            .with_body(r#"{"data":{"path":"secret/","type":"kv","options":{"version":"1"}}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/v1/sys/internal/ui/mounts/cubbyhole/app")
            .with_status(200)
            .with_body(r#"{"data":{"path":"cubbyhole/","type":"cubbyhole","options":null}}"#)
            .create_async()
            .await;

        let client = VaultClient::new(server.url(), "test-token".to_string()).unwrap();

        let mount = client.resolve_mount("secret/app").await.unwrap();
        assert_eq!(mount, BackendMount::unversioned("secret/"));

        let mount = client.resolve_mount("cubbyhole/app").await.unwrap();
        assert_eq!(mount, BackendMount::unversioned("cubbyhole/"));
    }

    #[tokio::test]
    async fn test_mount_info_404_assumes_v1() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/sys/internal/ui/mounts/old/app")
            .with_status(404)
            .create_async()
            .await;

        let client = VaultClient::new(server.url(), "test-token".to_string()).unwrap();
        let mount = client.resolve_mount("old/app").await.unwrap();
        assert_eq!(mount, BackendMount::unversioned(""));
    }

    #[tokio::test]
    async fn test_mount_info_permission_denied_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/sys/internal/ui/mounts/secret/app")
            .with_status(403)
            .with_body(r#"{"errors":["permission denied"]}"#)
            .create_async()
            .await;

        let client = VaultClient::new(server.url(), "bad-token".to_string()).unwrap();
        let err = client.resolve_mount("secret/app").await.unwrap_err();
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[tokio::test]
    async fn test_list_returns_data_object() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/kv2/metadata/app")
            .match_query(Matcher::UrlEncoded("list".into(), "true".into()))
            .match_header("x-vault-token", "test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"request_id":"r1","data":{"keys":["db-password","nested/"]}}"#)
            .create_async()
            .await;

        let client = VaultClient::new(server.url(), "test-token".to_string()).unwrap();
        let listing = client.list("kv2/metadata/app").await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(
            serde_json::to_value(&listing).unwrap(),
            serde_json::json!({"keys": ["db-password", "nested/"]})
        );
    }

    #[tokio::test]
    async fn test_list_404_is_absent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/secret/empty")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"errors":[]}"#)
            .create_async()
            .await;

        let client = VaultClient::new(server.url(), "test-token".to_string()).unwrap();
        assert!(client.list("secret/empty").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_without_data_is_absent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/secret/app")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"warnings":["nothing here"]}"#)
            .create_async()
            .await;

        server
            .mock("GET", "/v1/secret/null")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":null}"#)
            .create_async()
            .await;

        let client = VaultClient::new(server.url(), "test-token".to_string()).unwrap();
        assert!(client.list("secret/app").await.unwrap().is_none());
        assert!(client.list("secret/null").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/secret/app")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let client = VaultClient::new(server.url(), "test-token".to_string()).unwrap();
        let err = client.list("secret/app").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_namespace_header_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/secret/app")
            .match_query(Matcher::Any)
            .match_header("x-vault-namespace", "team-a")
            .with_status(200)
            .with_body(r#"{"data":{"keys":["a"]}}"#)
            .create_async()
            .await;

        let client = VaultClient::new(server.url(), "test-token".to_string())
            .unwrap()
            .with_namespace("team-a");
        assert!(client.list("secret/app").await.unwrap().is_some());
        mock.assert_async().await;
    }

    #[test]
    fn test_from_config_uses_namespace() {
        let config = VaultConfig {
            address: "http://127.0.0.1:8200/".to_string(),
            token: "t".to_string(),
            namespace: Some("team-a".to_string()),
            timeout_seconds: 5,
        };

        let client = VaultClient::from_config(&config).unwrap();
        assert_eq!(client.address, "http://127.0.0.1:8200");
        assert_eq!(client.namespace.as_deref(), Some("team-a"));
        assert_eq!(client.backend_type(), "HashiCorp Vault");
    }
}
