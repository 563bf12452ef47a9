mod builder;
mod subject;

pub use builder::{ECDSA_WITH_SHA_256, build_csr};
pub use subject::{ExtraName, SubjectName};
