mod client;

pub use client::{DEFAULT_ADDRESS, DEFAULT_TIMEOUT_SECS, VaultClient, VaultConfig};

use crate::error::Result;

/// The JSON object found under a Vault response's `data` key.
pub type SecretData = serde_json::Map<String, serde_json::Value>;

/// Logical read/write access to a Vault-style secrets service.
///
/// Paths are relative to the API root (e.g. `transit/keys/my-key`).
/// Implementations own transport, authentication and timeouts.
#[cfg_attr(test, mockall::automock)]
pub trait LogicalClient: Send + Sync {
    /// Read the data stored at `path`.
    fn read(&self, path: &str) -> Result<SecretData>;

    /// Write `args` to `path`, returning the response data.
    fn write(&self, path: &str, args: SecretData) -> Result<SecretData>;
}
