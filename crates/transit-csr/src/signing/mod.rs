mod composite;
mod public_key;
mod signer;
mod transit;

pub use composite::decode_composite_signature;
pub use public_key::{KeyAlgorithm, TransitPublicKey};
pub use signer::{PublicKeyLookup, RequestSigner};
pub use transit::{DEFAULT_MOUNT, KeyHandle, TransitSigner};
