pub mod csr;
pub mod error;
pub mod signing;
pub mod vault;

pub use csr::{SubjectName, build_csr};
pub use error::{Result, TransitError};
pub use signing::{KeyHandle, PublicKeyLookup, RequestSigner, TransitPublicKey, TransitSigner};
pub use vault::{LogicalClient, VaultClient, VaultConfig};
