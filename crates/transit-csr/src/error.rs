use std::path::PathBuf;

use crate::signing::KeyAlgorithm;

pub type Result<T, E = TransitError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Request to Vault path {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Vault path {path} returned HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },
    #[error("Nothing found at Vault path {path}")]
    NotFound { path: String },
    #[error("Invalid response from Vault path {path}: {detail}")]
    InvalidResponse { path: String, detail: String },
    #[error("Malformed transit signature: {0}")]
    Signature(String),
    #[error("Invalid public key: {0}")]
    PublicKey(String),
    #[error("No public key available for transit key {0}")]
    PublicKeyUnavailable(String),
    #[error("ECDSA with SHA-256 cannot be used with key type {algorithm} (transit key {key})")]
    KeyAlgorithmMismatch { key: String, algorithm: KeyAlgorithm },
    #[error("DER encoding failed: {0}")]
    Encoding(#[from] der::Error),
    #[error("Failed to read subject file {path}: {source}")]
    SubjectFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid subject JSON: {0}")]
    SubjectJson(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}
