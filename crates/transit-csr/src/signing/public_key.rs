use std::fmt;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use serde_json::Value;
use spki::SubjectPublicKeyInfoOwned;

use crate::error::{Result, TransitError};
use crate::vault::SecretData;

const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");
const ID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

/// Key types a transit public key may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    EcdsaP256,
    EcdsaP384,
    EcdsaP521,
    Ed25519,
}

impl KeyAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAlgorithm::EcdsaP256 => "ecdsa-p256",
            KeyAlgorithm::EcdsaP384 => "ecdsa-p384",
            KeyAlgorithm::EcdsaP521 => "ecdsa-p521",
            KeyAlgorithm::Ed25519 => "ed25519",
        }
    }

    pub fn is_ecdsa(&self) -> bool {
        !matches!(self, KeyAlgorithm::Ed25519)
    }

    /// Length of the encoded public key inside the SPKI bit string.
    fn key_len(&self) -> usize {
        match self {
            // uncompressed SEC1 points: 0x04 || X || Y
            KeyAlgorithm::EcdsaP256 => 65,
            KeyAlgorithm::EcdsaP384 => 97,
            KeyAlgorithm::EcdsaP521 => 133,
            KeyAlgorithm::Ed25519 => 32,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A PKIX public key as published by the transit engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitPublicKey {
    spki: SubjectPublicKeyInfoOwned,
    algorithm: KeyAlgorithm,
}

impl TransitPublicKey {
    /// Parse the first PEM block of `pem` as a `SubjectPublicKeyInfo`.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let (_label, der) = der::pem::decode_vec(pem.trim().as_bytes())
            .map_err(|e| TransitError::PublicKey(format!("invalid PEM: {e}")))?;
        Self::from_der(&der)
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoOwned::from_der(der)
            .map_err(|e| TransitError::PublicKey(format!("invalid SubjectPublicKeyInfo: {e}")))?;
        let algorithm = identify(&spki)?;

        let key = spki.subject_public_key.as_bytes().ok_or_else(|| {
            TransitError::PublicKey("public key bit string has unused bits".into())
        })?;
        if key.len() != algorithm.key_len() || (algorithm.is_ecdsa() && key[0] != 0x04) {
            return Err(TransitError::PublicKey(format!(
                "malformed {algorithm} public key ({} bytes)",
                key.len()
            )));
        }

        Ok(Self { spki, algorithm })
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn into_spki(self) -> SubjectPublicKeyInfoOwned {
        self.spki
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.spki.to_der()?)
    }
}

fn identify(spki: &SubjectPublicKeyInfoOwned) -> Result<KeyAlgorithm> {
    let oid = spki.algorithm.oid;
    if oid == ID_ED25519 {
        return Ok(KeyAlgorithm::Ed25519);
    }
    if oid != ID_EC_PUBLIC_KEY {
        return Err(TransitError::PublicKey(format!("unsupported key algorithm {oid}")));
    }

    let curve = spki
        .algorithm
        .parameters
        .as_ref()
        .ok_or_else(|| TransitError::PublicKey("EC key without named curve".into()))?
        .decode_as::<ObjectIdentifier>()
        .map_err(|e| TransitError::PublicKey(format!("invalid EC parameters: {e}")))?;

    if curve == SECP256R1 {
        Ok(KeyAlgorithm::EcdsaP256)
    } else if curve == SECP384R1 {
        Ok(KeyAlgorithm::EcdsaP384)
    } else if curve == SECP521R1 {
        Ok(KeyAlgorithm::EcdsaP521)
    } else {
        Err(TransitError::PublicKey(format!("unsupported curve {curve}")))
    }
}

/// Pick the key version whose public key should be embedded.
///
/// Prefers the version named by `latest_version`, falling back to the
/// highest numbered entry under `keys`.
pub(crate) fn select_key_version(data: &SecretData) -> Result<(String, &str)> {
    let invalid = |detail: &str| TransitError::PublicKey(detail.to_string());

    let keys = data
        .get("keys")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("response has no `keys` map"))?;

    let latest = data
        .get("latest_version")
        .and_then(Value::as_u64)
        .map(|v| v.to_string())
        .filter(|v| keys.contains_key(v));

    let version = match latest {
        Some(version) => version,
        None => keys
            .keys()
            .filter_map(|k| k.parse::<u64>().ok())
            .max()
            .map(|v| v.to_string())
            .ok_or_else(|| invalid("`keys` map has no numbered versions"))?,
    };

    let pem = keys
        .get(&version)
        .and_then(|entry| entry.get("public_key"))
        .and_then(Value::as_str)
        .filter(|pem| !pem.is_empty())
        .ok_or_else(|| TransitError::PublicKey(format!("key version {version} has no public_key")))?;

    Ok((version, pem))
}
