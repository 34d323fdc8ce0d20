//! Typed counters for spills and graph nodes.
//!
//! Both are allocated from per-engine or per-run counters, never globally.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! counter_id {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(v: u64) -> Self {
                Self(v)
            }

            pub const fn get(self) -> u64 {
                self.0
            }

            /// The id allocated after this one.
            pub const fn succ(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $label, self.0)
            }
        }
    };
}

counter_id!(
    /// One per external sort; prefixes the segment names of its runs.
    SpillId, "spill"
);
counter_id!(
    /// One per realized operator stream.
    NodeId, "node"
);
