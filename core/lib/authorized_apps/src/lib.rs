//! Authorized-app registry (C4): per-package publish policy, cached with
//! expiry-only invalidation.

pub mod error;
pub mod registry;

pub use error::{AuthorizedAppError, Result};
pub use registry::AuthorizedAppRegistry;
