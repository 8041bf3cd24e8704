//! HashiCorp Vault implementation of [`SecretStore`] over the HTTP API

use crate::remote::SecretStore;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use vaultkeep_core::config::VaultSettings;
use vaultkeep_core::types::{key_path, EngineMount, EngineType, Payload, RawEncoding, RawEntry};
use vaultkeep_core::{Error, Result};
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};

/// Mount types that never hold backup-worthy secrets
const SKIPPED_MOUNT_TYPES: &[&str] = &["system", "cubbyhole", "identity", "consul", "generic"];

/// Message Vault returns when a raw key exists but holds nothing
const EMPTY_RAW_VALUE_MESSAGE: &str = "being decompressed is empty";

#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub address: String,
    pub token: String,
    pub namespace: Option<String>,
    pub timeout: Duration,
    pub retry: RetryConfig,
    pub insecure_skip_verify: bool,
}

/// Backoff for idempotent requests. Writes are never retried.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl VaultConfig {
    /// Build from loaded settings; address and token are required
    pub fn from_settings(settings: &VaultSettings) -> Result<Self> {
        let address = settings
            .address
            .clone()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| Error::config("Vault address not set (VAULT_ADDR or vault.address)"))?;
        let token = settings
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::config("VAULT_TOKEN environment variable not set"))?;

        Ok(Self {
            address: address.trim_end_matches('/').to_string(),
            token,
            namespace: settings.namespace.clone().filter(|n| !n.is_empty()),
            timeout: settings.timeout(),
            retry: RetryConfig {
                max_attempts: settings.retry.max_attempts,
                base_delay: Duration::from_millis(settings.retry.base_delay_ms),
                max_delay: Duration::from_millis(settings.retry.max_delay_ms),
            },
            insecure_skip_verify: settings.skip_verify,
        })
    }
}

pub struct VaultStore {
    config: Arc<VaultConfig>,
    http: reqwest::Client,
}

impl VaultStore {
    pub fn new(config: VaultConfig) -> Result<Self> {
        if config.insecure_skip_verify {
            warn!("TLS verification disabled");
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Confirm the token is accepted before any pass starts
    pub async fn validate_token(&self) -> Result<()> {
        let mut settings = VaultClientSettingsBuilder::default();
        settings.address(&self.config.address);
        settings.token(&self.config.token);
        settings.timeout(Some(self.config.timeout));

        if let Some(ns) = &self.config.namespace {
            settings.namespace(Some(ns.clone()));
        }

        if self.config.insecure_skip_verify {
            settings.verify(false);
        }

        let settings = settings
            .build()
            .map_err(|e| Error::config(format!("Failed to build Vault client settings: {}", e)))?;
        let client = VaultClient::new(settings)
            .map_err(|e| Error::config(format!("Failed to create Vault client: {}", e)))?;

        match vaultrs::token::lookup(&client, &self.config.token).await {
            Ok(_) => {
                debug!("Token validation successful");
                Ok(())
            }
            Err(e) => Err(Error::remote(
                "auth/token/lookup",
                StatusCode::FORBIDDEN.as_u16(),
                format!("Token validation failed: {}", e),
            )),
        }
    }

    fn url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}/v1/{}", self.config.address, path.trim_start_matches('/'));
        if let Some(q) = query {
            url.push('?');
            url.push_str(q);
        }
        url
    }

    /// Send one request and classify any failure
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let mut request = self
            .http
            .request(method, self.url(path, query))
            .header("X-Vault-Token", &self.config.token);

        if let Some(ns) = &self.config.namespace {
            request = request.header("X-Vault-Namespace", ns);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::remote(path, 0, e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::remote(path, status.as_u16(), e.to_string()))?;

        if !status.is_success() {
            return Err(classify_error(path, status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str(&text).map_err(|e| Error::decode(path, e))?;
        Ok(Some(value))
    }

    /// GET with exponential backoff on transport errors and 5xx responses
    async fn get_with_retry(&self, path: &str, query: Option<&str>) -> Result<Value> {
        let mut attempt = 0;
        let mut delay = self.config.retry.base_delay;

        loop {
            match self.send(Method::GET, path, query, None).await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => return Err(Error::not_found(path)),
                Err(e) if is_retryable(&e) && attempt + 1 < self.config.retry.max_attempts => {
                    warn!(
                        "Vault request failed (attempt {}/{}): {}",
                        attempt + 1,
                        self.config.retry.max_attempts,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, self.config.retry.max_delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let body = self.get_with_retry(path, Some("list=true")).await?;
        parse_list_keys(path, &body)
    }
}

#[async_trait]
impl SecretStore for VaultStore {
    async fn list_children(&self, path: &str) -> Result<Vec<String>> {
        debug!("List vault path: {}", path);
        self.list(path).await
    }

    async fn read_secret(&self, path: &str, version: Option<u64>) -> Result<Payload> {
        debug!("Read vault path: {} (version {:?})", path, version);
        let query = version.map(|v| format!("version={}", v));
        let body = self.get_with_retry(path, query.as_deref()).await?;
        match body.get("data") {
            Some(Value::Object(data)) => Ok(data.clone()),
            Some(Value::Null) | None => Err(Error::not_found(path)),
            Some(other) => Err(Error::decode(
                path,
                format!("expected an object in data, got {}", other),
            )),
        }
    }

    async fn write_secret(&self, path: &str, data: &Payload) -> Result<()> {
        debug!("Write vault path: {}", path);
        let body = Value::Object(data.clone());
        self.send(Method::POST, path, None, Some(&body)).await?;
        Ok(())
    }

    async fn destroy_versions(&self, mount: &str, key: &str, versions: &[u64]) -> Result<()> {
        let path = key_path::join(&[mount, "destroy", key]);
        debug!("Destroy versions {:?} of {}", versions, path);
        let body = json!({ "versions": versions });
        self.send(Method::POST, &path, None, Some(&body)).await?;
        Ok(())
    }

    async fn read_raw_key(&self, path: &str) -> Result<RawEntry> {
        let raw_path = key_path::join(&["sys/raw", path]);
        debug!("Read raw path: {}", raw_path);
        let body = self.get_with_retry(&raw_path, None).await?;
        let value = body
            .get("data")
            .and_then(|d| d.get("value"))
            .or_else(|| body.get("value"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::decode(&raw_path, "response has no string value"))?;
        Ok(RawEntry::plain(value))
    }

    async fn write_raw_key(&self, path: &str, entry: &RawEntry) -> Result<()> {
        let raw_path = key_path::join(&["sys/raw", path]);
        debug!("Write raw path: {}", raw_path);
        let mut body = json!({ "value": entry.value });
        if let Some(encoding) = entry.encoding.as_param() {
            body["encoding"] = Value::String(encoding.to_string());
        }
        self.send(Method::POST, &raw_path, None, Some(&body)).await?;
        Ok(())
    }

    async fn list_raw_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let raw_path = key_path::join(&["sys/raw", prefix]);
        debug!("List raw path: {}", raw_path);
        self.list(&raw_path).await
    }

    async fn list_mounted_engines(&self) -> Result<Vec<EngineMount>> {
        let body = self.get_with_retry("sys/mounts", None).await?;
        Ok(parse_mounts(&body))
    }

    fn name(&self) -> &'static str {
        "vault"
    }
}

/// Map a failed response onto the error taxonomy
fn classify_error(path: &str, status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("errors").and_then(Value::as_array).map(|errs| {
                errs.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("; ")
            })
        })
        .unwrap_or_else(|| body.trim().to_string());

    if message.contains(EMPTY_RAW_VALUE_MESSAGE) {
        return Error::empty_value(path);
    }
    if status == StatusCode::NOT_FOUND.as_u16() {
        return Error::not_found(path);
    }
    Error::remote(path, status, message)
}

fn is_retryable(err: &Error) -> bool {
    match err {
        Error::Remote { status, .. } => *status == 0 || *status == 429 || *status >= 500,
        _ => false,
    }
}

fn parse_list_keys(path: &str, body: &Value) -> Result<Vec<String>> {
    let keys = body
        .get("data")
        .and_then(|d| d.get("keys"))
        .and_then(Value::as_array)
        .ok_or_else(|| Error::decode(path, "list response has no data.keys"))?;

    keys.iter()
        .map(|k| {
            k.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::decode(path, format!("non-string key {}", k)))
        })
        .collect()
}

/// Parse `sys/mounts`, dropping system mounts, sorted by path
fn parse_mounts(body: &Value) -> Vec<EngineMount> {
    let table = body
        .get("data")
        .and_then(Value::as_object)
        .or_else(|| body.as_object());

    let mut mounts: Vec<EngineMount> = table
        .into_iter()
        .flatten()
        .filter_map(|(path, info)| {
            let mount_type = info.get("type")?.as_str()?;
            if SKIPPED_MOUNT_TYPES.contains(&mount_type) {
                return None;
            }
            let version = info
                .get("options")
                .and_then(|o| o.get("version"))
                .and_then(Value::as_str);
            let uuid = info.get("uuid").and_then(Value::as_str).unwrap_or_default();
            Some(EngineMount::new(
                path.as_str(),
                EngineType::from_mount(mount_type, version),
                uuid,
            ))
        })
        .collect();

    mounts.sort_by(|a, b| a.path.cmp(&b.path));
    mounts
}
