//! Blocking HTTP client for the Vault logical API.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;

use super::{LogicalClient, SecretData};
use crate::error::{Result, TransitError};

pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:8200";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for a Vault server.
#[derive(Clone)]
pub struct VaultConfig {
    /// Base address, e.g. `https://vault.example.com:8200`.
    pub address: String,
    pub token: String,
    /// Enterprise namespace sent as `X-Vault-Namespace`.
    pub namespace: Option<String>,
    pub timeout_secs: u64,
}

impl VaultConfig {
    #[must_use]
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            namespace: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// [`LogicalClient`] speaking Vault's HTTP API (`/v1/<path>`).
///
/// One client is meant to be shared by every signer in a session.
pub struct VaultClient {
    http: Client,
    address: String,
    token: String,
    namespace: Option<String>,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl VaultClient {
    /// # Errors
    /// Returns [`TransitError::Config`] if the address or token is empty or
    /// the HTTP client cannot be built.
    pub fn new(config: VaultConfig) -> Result<Self> {
        let address = config.address.trim().trim_end_matches('/').to_string();
        if address.is_empty() {
            return Err(TransitError::Config("Vault address has to be specified".into()));
        }
        if config.token.is_empty() {
            return Err(TransitError::Config("Vault token has to be specified".into()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransitError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            address,
            token: config.token,
            namespace: config.namespace,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("X-Vault-Token", &self.token);
        match &self.namespace {
            Some(namespace) => request.header("X-Vault-Namespace", namespace),
            None => request,
        }
    }

    fn send(&self, path: &str, request: RequestBuilder) -> Result<SecretData> {
        let response = self
            .authorize(request)
            .send()
            .map_err(|source| TransitError::Http {
                path: path.to_string(),
                source,
            })?;
        Self::secret_data(path, response)
    }

    fn secret_data(path: &str, response: Response) -> Result<SecretData> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TransitError::NotFound {
                path: path.to_string(),
            });
        }

        let body = response.text().map_err(|source| TransitError::Http {
            path: path.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(TransitError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(SecretData::new());
        }

        let invalid = |detail: String| TransitError::InvalidResponse {
            path: path.to_string(),
            detail,
        };
        let mut json: Value = serde_json::from_str(&body).map_err(|e| invalid(e.to_string()))?;
        match json.get_mut("data").map(Value::take) {
            Some(Value::Object(data)) => Ok(data),
            Some(Value::Null) | None => Ok(SecretData::new()),
            Some(other) => Err(invalid(format!("expected `data` to be an object, got {other}"))),
        }
    }
}

impl LogicalClient for VaultClient {
    fn read(&self, path: &str) -> Result<SecretData> {
        tracing::debug!(path, "Vault: read");
        self.send(path, self.http.get(self.url(path)))
    }

    fn write(&self, path: &str, args: SecretData) -> Result<SecretData> {
        tracing::debug!(path, "Vault: write");
        self.send(path, self.http.post(self.url(path)).json(&args))
    }
}
