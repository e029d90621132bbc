//! Typed row identifiers
//!
//! All identifiers are SQLite rowids. A well-formed identifier is strictly
//! positive; zero and negative values never name a stored row.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Raw rowid value
            pub fn get(self) -> i64 {
                self.0
            }

            /// True when the id could name a stored row
            pub fn is_well_formed(self) -> bool {
                self.0 > 0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Identifier of a user account
    UserId
);
row_id!(
    /// Identifier of a court (the bookable resource)
    CourtId
);
row_id!(
    /// Identifier of a booking
    BookingId
);
