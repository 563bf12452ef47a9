use const_oid::ObjectIdentifier;
use der::asn1::BitString;
use der::pem::LineEnding;
use der::{Encode, EncodePem};
use sha2::{Digest, Sha256};
use spki::AlgorithmIdentifierOwned;
use x509_cert::request::{CertReq, CertReqInfo, Version};

use super::subject::SubjectName;
use crate::error::{Result, TransitError};
use crate::signing::{PublicKeyLookup, RequestSigner};

pub const ECDSA_WITH_SHA_256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");

/// Create a PEM encoded PKCS#10 request for `subject`, signed by `signer`
/// with ECDSA over SHA-256.
///
/// The subject is encoded before the signer is contacted. The signer is then
/// asked for its public key once and signs the SHA-256 digest of the request
/// info once. Nothing is returned unless both succeed.
pub fn build_csr(subject: &SubjectName, signer: &dyn RequestSigner) -> Result<String> {
    let subject = subject.to_name()?;

    let public_key = match signer.public_key() {
        PublicKeyLookup::Available(key) => key,
        PublicKeyLookup::Unavailable => {
            return Err(TransitError::PublicKeyUnavailable(signer.key_name().to_string()));
        }
    };
    if !public_key.algorithm().is_ecdsa() {
        return Err(TransitError::KeyAlgorithmMismatch {
            key: signer.key_name().to_string(),
            algorithm: public_key.algorithm(),
        });
    }

    let info = CertReqInfo {
        version: Version::V1,
        subject,
        public_key: public_key.into_spki(),
        attributes: Default::default(),
    };

    let digest = Sha256::digest(info.to_der()?);
    let signature = signer.sign(&digest, true)?;

    let request = CertReq {
        info,
        algorithm: AlgorithmIdentifierOwned {
            oid: ECDSA_WITH_SHA_256,
            parameters: None,
        },
        signature: BitString::from_bytes(&signature)?,
    };

    tracing::info!(key = signer.key_name(), "Created certificate request");
    Ok(request.to_pem(LineEnding::LF)?)
}
