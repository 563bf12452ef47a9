use crate::error::Result;

use super::public_key::TransitPublicKey;

/// Result of asking a signer for its public key.
///
/// Key retrieval has no error channel; a signer that cannot produce its key
/// reports [`PublicKeyLookup::Unavailable`] and callers treat that as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeyLookup {
    Available(TransitPublicKey),
    Unavailable,
}

impl PublicKeyLookup {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn into_key(self) -> Option<TransitPublicKey> {
        match self {
            Self::Available(key) => Some(key),
            Self::Unavailable => None,
        }
    }
}

/// A private key that can only be used through its two capabilities.
///
/// Implementations are sync; both calls may block on the network.
pub trait RequestSigner: Send + Sync {
    /// Public half of the signing key.
    fn public_key(&self) -> PublicKeyLookup;

    /// Sign `digest`. When `prehashed` is set the bytes are already a hash
    /// and must not be hashed again. Returns raw signature bytes.
    fn sign(&self, digest: &[u8], prehashed: bool) -> Result<Vec<u8>>;

    /// Name of the key, for diagnostics.
    fn key_name(&self) -> &str;
}
