use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use super::composite::decode_composite_signature;
use super::public_key::{TransitPublicKey, select_key_version};
use super::signer::{PublicKeyLookup, RequestSigner};
use crate::error::{Result, TransitError};
use crate::vault::{LogicalClient, SecretData};

pub const DEFAULT_MOUNT: &str = "transit";

/// Name of a key held by the transit engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyHandle(String);

impl KeyHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signer backed by a Vault transit key.
///
/// Holds no key material and caches nothing: every call goes to Vault
/// through the shared client.
pub struct TransitSigner {
    client: Arc<dyn LogicalClient>,
    handle: KeyHandle,
    mount: String,
}

impl TransitSigner {
    pub fn new(client: Arc<dyn LogicalClient>, handle: KeyHandle) -> Self {
        Self {
            client,
            handle,
            mount: DEFAULT_MOUNT.to_string(),
        }
    }

    /// Use a transit engine mounted somewhere other than `transit/`.
    #[must_use]
    pub fn with_mount(mut self, mount: impl AsRef<str>) -> Self {
        self.mount = mount.as_ref().trim_matches('/').to_string();
        self
    }

    pub fn handle(&self) -> &KeyHandle {
        &self.handle
    }

    fn keys_path(&self) -> String {
        format!("{}/keys/{}", self.mount, self.handle)
    }

    fn sign_path(&self) -> String {
        format!("{}/sign/{}", self.mount, self.handle)
    }

    fn fetch_public_key(&self) -> Result<TransitPublicKey> {
        let data = self.client.read(&self.keys_path())?;
        let (version, pem) = select_key_version(&data)?;
        tracing::debug!(key = %self.handle, version = %version, "Transit: using public key version");
        TransitPublicKey::from_pem(pem)
    }
}

impl RequestSigner for TransitSigner {
    fn public_key(&self) -> PublicKeyLookup {
        match self.fetch_public_key() {
            Ok(key) => PublicKeyLookup::Available(key),
            Err(error) => {
                tracing::warn!(key = %self.handle, %error, "Transit: public key unavailable");
                PublicKeyLookup::Unavailable
            }
        }
    }

    fn sign(&self, digest: &[u8], prehashed: bool) -> Result<Vec<u8>> {
        let path = self.sign_path();
        let mut args = SecretData::new();
        args.insert("input".into(), Value::String(STANDARD.encode(digest)));
        args.insert("prehashed".into(), Value::Bool(prehashed));

        let response = self.client.write(&path, args)?;
        let composite = response
            .get("signature")
            .and_then(Value::as_str)
            .ok_or_else(|| TransitError::Signature(format!("no signature in response from {path}")))?;
        decode_composite_signature(composite)
    }

    fn key_name(&self) -> &str {
        self.handle.as_str()
    }
}
