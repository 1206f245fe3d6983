//! Operator-prefixed identifiers.
//!
//! Every identifier in the merged timetable carries an operator prefix
//! (`SNCF:…`, `TI:S01700`, `ES:paris_nord_3`). The prefix is the
//! authoritative operator tag: two feeds can reuse the same raw identifier
//! without colliding, and the operator of any record can be recovered from
//! its id alone.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! prefixed_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Build an id by prefixing a raw feed identifier with its
            /// operator code.
            pub fn new(operator: &str, raw: &str) -> Self {
                Self(format!("{operator}:{raw}"))
            }

            /// Wrap an already-prefixed identifier.
            pub fn from_raw(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// The full prefixed identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The operator prefix (text before the first `:`), or the
            /// whole id if no prefix is present.
            pub fn operator(&self) -> &str {
                match self.0.split_once(':') {
                    Some((op, _)) => op,
                    None => &self.0,
                }
            }

            /// The raw feed-local part (text after the first `:`).
            pub fn local(&self) -> &str {
                match self.0.split_once(':') {
                    Some((_, rest)) => rest,
                    None => &self.0,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

prefixed_id! {
    /// Identifier of one stop point (one platform, one operator).
    StopId
}

prefixed_id! {
    /// Identifier of a logical route (equivalence class of trips sharing a
    /// stop sequence).
    RouteId
}

prefixed_id! {
    /// Identifier of one scheduled trip.
    TripId
}

prefixed_id! {
    /// Identifier of a calendar service pattern.
    ServiceId
}
