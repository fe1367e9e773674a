//! Typed identifiers, to avoid passing bare integers/strings across crate
//! boundaries (mirrors the id-wrapping convention used throughout the
//! teacher's `core/lib/types` crate).

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident, $repr:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $repr);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$repr> for $name {
            fn from(value: $repr) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(HealthAuthorityId, i64);
id_newtype!(AuthorizedAppId, i64);
id_newtype!(ExportConfigId, i64);
id_newtype!(ExportBatchId, i64);
id_newtype!(SignatureInfoId, i64);
id_newtype!(RevisionKeyId, u32);
