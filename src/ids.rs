//! Identifier types shared across the coach core.
//!
//! Identities are assigned by the transport layer (the chat platform) and
//! arrive already authenticated; the core never mints user identifiers
//! itself. Newtypes keep user and message identifiers from being mixed up
//! at compile time.

use core::fmt;
use core::str::FromStr;
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};

/// Declare an integer ID newtype with a consistent API.
macro_rules! define_int_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap a raw transport-assigned identifier.
            #[inline]
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Extract the raw identifier.
            #[inline]
            #[must_use]
            pub const fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            #[inline]
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            #[inline]
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            #[inline]
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

define_int_id!(
    /// Identifier of one end user, as assigned by the transport.
    UserId
);

define_int_id!(
    /// Identifier of one inbound message within a user's chat.
    MessageId
);
