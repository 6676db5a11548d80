//! Contains common, primitive identifier types.
//!
//! Tournament, venue and staff identifiers all come from the external platform
//! as opaque strings. Wrapping each in its own type keeps a venue id from ever
//! being passed where a tournament id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id! {
    /// Uniquely identifies a tournament. This is the key of the `ClockStore`.
    TournamentId
}

string_id! {
    /// Identifies the venue that runs a tournament.
    VenueId
}

string_id! {
    /// Identifies a staff member of one or more venues.
    StaffId
}
