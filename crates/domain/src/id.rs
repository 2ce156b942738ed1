//! Typed identifiers.
//!
//! Every record kind gets its own UUID newtype so a [`RecipeId`] can never
//! be passed where a [`ServiceId`] is expected. All of them serialize as the
//! bare hyphenated UUID string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string that is not a valid identifier of the given kind.
#[derive(Debug, thiserror::Error)]
#[error("invalid {kind} id {input:?}")]
pub struct InvalidId {
    pub kind: &'static str,
    pub input: String,
    #[source]
    source: uuid::Error,
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Record kind, used in error messages.
            pub const KIND: &'static str = $kind;

            /// A fresh random (v4) identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|source| InvalidId {
                        kind: Self::KIND,
                        input: s.to_string(),
                        source,
                    })
            }
        }
    };
}

typed_id!(
    /// Identifies an [`ExternalService`](crate::external_service::ExternalService).
    ServiceId,
    "service"
);

typed_id!(
    /// Identifies a [`Recipe`](crate::recipe::Recipe).
    RecipeId,
    "recipe"
);

typed_id!(
    /// Identifies a [`RecipeAction`](crate::recipe::RecipeAction) inside its recipe.
    RecipeActionId,
    "recipe action"
);

typed_id!(
    /// Identifies one [`RecipeInvocation`](crate::invocation::RecipeInvocation).
    InvocationId,
    "invocation"
);
