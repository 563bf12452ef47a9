//! In-memory stand-in for a Vault transit engine holding P-256 keys.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::{EncodePublicKey, LineEnding};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use transit_csr::vault::SecretData;
use transit_csr::{LogicalClient, Result, TransitError};

/// Deterministic P-256 key: the SHA-256 hash of the seed is the scalar.
pub fn key_from_seed(seed: &str) -> SigningKey {
    let hash = Sha256::digest(seed.as_bytes());
    SigningKey::from_bytes(&hash).expect("seed hash is a valid P-256 scalar")
}

pub fn public_key_pem(key: &SigningKey) -> String {
    p256::PublicKey::from(key.verifying_key())
        .to_public_key_pem(LineEnding::LF)
        .unwrap()
}

pub fn public_key_der(key: &SigningKey) -> Vec<u8> {
    p256::PublicKey::from(key.verifying_key())
        .to_public_key_der()
        .unwrap()
        .into_vec()
}

pub struct FakeTransit {
    name: String,
    versions: Mutex<BTreeMap<u64, SigningKey>>,
    public_key_override: Mutex<Option<String>>,
    signature_override: Mutex<Option<String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
    signatures: Mutex<Vec<Vec<u8>>>,
    sign_args: Mutex<Vec<SecretData>>,
}

impl FakeTransit {
    pub fn new(name: &str, seed: &str) -> Self {
        Self {
            name: name.to_string(),
            versions: Mutex::new(BTreeMap::from([(1, key_from_seed(seed))])),
            public_key_override: Mutex::new(None),
            signature_override: Mutex::new(None),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            signatures: Mutex::new(Vec::new()),
            sign_args: Mutex::new(Vec::new()),
        }
    }

    /// Add a new key version, which becomes the latest.
    pub fn rotate(&self, seed: &str) {
        let mut versions = self.versions.lock().unwrap();
        let next = versions.keys().last().copied().unwrap_or(0) + 1;
        versions.insert(next, key_from_seed(seed));
    }

    pub fn latest_key(&self) -> SigningKey {
        self.versions.lock().unwrap().values().last().unwrap().clone()
    }

    pub fn serve_public_key(&self, pem: &str) {
        *self.public_key_override.lock().unwrap() = Some(pem.to_string());
    }

    pub fn serve_signature(&self, composite: &str) {
        *self.signature_override.lock().unwrap() = Some(composite.to_string());
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw signatures produced so far, in order.
    pub fn signatures(&self) -> Vec<Vec<u8>> {
        self.signatures.lock().unwrap().clone()
    }

    pub fn sign_args(&self) -> Vec<SecretData> {
        self.sign_args.lock().unwrap().clone()
    }

    fn unavailable(path: &str) -> TransitError {
        TransitError::Status {
            path: path.to_string(),
            status: 503,
            body: r#"{"errors":["Vault is sealed"]}"#.to_string(),
        }
    }

    fn key_metadata(&self) -> SecretData {
        let versions = self.versions.lock().unwrap();
        let override_pem = self.public_key_override.lock().unwrap().clone();

        let keys: serde_json::Map<String, Value> = versions
            .iter()
            .map(|(version, key)| {
                let pem = override_pem.clone().unwrap_or_else(|| public_key_pem(key));
                (
                    version.to_string(),
                    json!({
                        "creation_time": "2024-05-01T12:00:00.000000000Z",
                        "name": "P-256",
                        "public_key": pem,
                    }),
                )
            })
            .collect();

        let latest = versions.keys().last().copied().unwrap_or(0);
        json!({
            "name": self.name,
            "type": "ecdsa-p256",
            "latest_version": latest,
            "min_decryption_version": 1,
            "supports_signing": true,
            "keys": keys,
        })
        .as_object()
        .unwrap()
        .clone()
    }

    fn sign(&self, path: &str, args: &SecretData) -> Result<SecretData> {
        let invalid = |body: &str| TransitError::Status {
            path: path.to_string(),
            status: 400,
            body: body.to_string(),
        };

        let input = args
            .get("input")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing input"))?;
        let input = STANDARD.decode(input).map_err(|_| invalid("input is not base64"))?;
        let prehashed = args.get("prehashed").and_then(Value::as_bool).unwrap_or(false);
        let digest = if prehashed {
            input
        } else {
            Sha256::digest(&input).to_vec()
        };

        let (version, key) = {
            let versions = self.versions.lock().unwrap();
            let (version, key) = versions.iter().last().unwrap();
            (*version, key.clone())
        };
        let signature: Signature = key
            .sign_prehash(&digest)
            .map_err(|_| invalid("digest has the wrong length"))?;
        let der = signature.to_der().as_bytes().to_vec();

        let composite = match self.signature_override.lock().unwrap().clone() {
            Some(composite) => composite,
            None => {
                self.signatures.lock().unwrap().push(der.clone());
                format!("vault:v{version}:{}", STANDARD.encode(&der))
            }
        };

        Ok(json!({ "key_version": version, "signature": composite })
            .as_object()
            .unwrap()
            .clone())
    }
}

impl LogicalClient for FakeTransit {
    fn read(&self, path: &str) -> Result<SecretData> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable(path));
        }
        if path != format!("transit/keys/{}", self.name) {
            return Err(TransitError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(self.key_metadata())
    }

    fn write(&self, path: &str, args: SecretData) -> Result<SecretData> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.sign_args.lock().unwrap().push(args.clone());
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable(path));
        }
        if path != format!("transit/sign/{}", self.name) {
            return Err(TransitError::NotFound {
                path: path.to_string(),
            });
        }
        self.sign(path, &args)
    }
}
