//! Stock joiners: inner, left, right, and full outer.
//!
//! Matching groups produce the cartesian product of their records. A non-key
//! column present on both sides is kept twice, renamed with the left and right
//! suffixes (`_1` / `_2` by default). Key columns come from the left record.
//! Unmatched groups that a variant keeps are emitted unchanged.

use std::rc::Rc;

use rowflow_core::key::GroupKey;
use rowflow_core::types::Record;

use crate::adapters;
use crate::traits::{Group, Joiner, RecordIter};

/// Column suffixes applied to clashing non-key columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suffixes {
    pub left: String,
    pub right: String,
}

impl Default for Suffixes {
    fn default() -> Self {
        Self {
            left: "_1".into(),
            right: "_2".into(),
        }
    }
}

impl Suffixes {
    /// Merge one left and one right record into a joined record.
    pub fn combine(&self, key: &GroupKey, left: &Record, right: &Record) -> Record {
        let mut out = Record::new();
        for (column, value) in left {
            if key.spec().contains(column) {
                out.insert(column.clone(), value.clone());
            } else if right.contains(column) {
                out.insert(format!("{column}{}", self.left), value.clone());
            } else {
                out.insert(column.clone(), value.clone());
            }
        }
        for (column, value) in right {
            if key.spec().contains(column) {
                continue;
            }
            if left.contains(column) {
                out.insert(format!("{column}{}", self.right), value.clone());
            } else {
                out.insert(column.clone(), value.clone());
            }
        }
        out
    }

    /// Pairs are combined as they are pulled; only the right group is held.
    fn product(&self, key: &GroupKey, left: Group, right: Group) -> RecordIter {
        let pairing = Rc::new(Pairing {
            suffixes: self.clone(),
            key: key.clone(),
            right: right.collect(),
        });
        Box::new(left.flat_map(move |l| {
            let pairing = Rc::clone(&pairing);
            (0..pairing.right.len()).map(move |i| {
                Ok(pairing
                    .suffixes
                    .combine(&pairing.key, &l, &pairing.right[i]))
            })
        }))
    }
}

struct Pairing {
    suffixes: Suffixes,
    key: GroupKey,
    right: Vec<Record>,
}

macro_rules! stock_joiner {
    ($(#[$doc:meta])* $name:ident, left_only: $keep_left:expr, right_only: $keep_right:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            suffixes: Suffixes,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn with_suffixes(left: impl Into<String>, right: impl Into<String>) -> Self {
                Self {
                    suffixes: Suffixes {
                        left: left.into(),
                        right: right.into(),
                    },
                }
            }

            pub fn suffixes(&self) -> &Suffixes {
                &self.suffixes
            }
        }

        impl Joiner for $name {
            fn on_match(&self, key: &GroupKey, left: Group, right: Group) -> RecordIter {
                self.suffixes.product(key, left, right)
            }

            fn on_left_only(&self, _key: &GroupKey, left: Group) -> RecordIter {
                if $keep_left {
                    Box::new(left.map(Ok))
                } else {
                    adapters::empty()
                }
            }

            fn on_right_only(&self, _key: &GroupKey, right: Group) -> RecordIter {
                if $keep_right {
                    Box::new(right.map(Ok))
                } else {
                    adapters::empty()
                }
            }
        }
    };
}

stock_joiner!(
    /// Keeps only keys present on both sides.
    InnerJoiner, left_only: false, right_only: false
);
stock_joiner!(
    /// Keeps every left key.
    LeftJoiner, left_only: true, right_only: false
);
stock_joiner!(
    /// Keeps every right key.
    RightJoiner, left_only: false, right_only: true
);
stock_joiner!(
    /// Keeps every key from either side.
    OuterJoiner, left_only: true, right_only: true
);
