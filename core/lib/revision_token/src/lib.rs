//! Revision-token codec (C5): seals a capability list under the current
//! rotating AEAD key, and opens tokens sealed under the current key or any
//! retained prior key.

pub mod codec;
pub mod db_provider;
pub mod error;
pub mod provider;

pub use codec::{build_token, RevisionTokenCodec};
pub use db_provider::DbRevisionKeyProvider;
pub use error::{Result, RevisionTokenError};
pub use provider::RevisionKeyProvider;
