//! Key specifications and the key tuples they project out of records.
//!
//! Sort, Reduce, and Join all order and group records by a `KeyTuple`: the
//! ordered projection of a record onto a non-empty list of columns.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Record, Value};

/// Validated, non-empty list of key column names. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    columns: Arc<[String]>,
}

impl KeySpec {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(Error::Construction("key list must not be empty".into()));
        }
        if let Some(blank) = columns.iter().find(|c| c.is_empty()) {
            return Err(Error::Construction(format!(
                "key column names must be non-empty (got {blank:?})"
            )));
        }
        Ok(Self {
            columns: columns.into(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Project `record` onto the key columns.
    pub fn project(&self, record: &Record) -> Result<KeyTuple> {
        let values = self
            .columns
            .iter()
            .map(|c| record.require(c).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(KeyTuple(values))
    }
}

/// Ordered projection of a record onto a `KeySpec`.
///
/// Compares lexicographically, column by column, using `Value`'s order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyTuple(Vec<Value>);

impl KeyTuple {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for KeyTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

/// Key of one group handed to a reducer or joiner: the column names together
/// with the values this group shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey {
    spec: KeySpec,
    tuple: KeyTuple,
}

impl GroupKey {
    pub fn new(spec: KeySpec, tuple: KeyTuple) -> Self {
        Self { spec, tuple }
    }

    pub fn columns(&self) -> &[String] {
        self.spec.columns()
    }

    pub fn spec(&self) -> &KeySpec {
        &self.spec
    }

    pub fn tuple(&self) -> &KeyTuple {
        &self.tuple
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.spec
            .columns()
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.tuple.values().get(i))
    }

    /// A record holding just the key columns.
    pub fn to_record(&self) -> Record {
        self.spec
            .columns()
            .iter()
            .cloned()
            .zip(self.tuple.values().iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_empty_keys_rejected() {
        let err = KeySpec::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, Error::Construction(_)));
        assert!(KeySpec::new([""]).is_err());
    }

    #[test]
    fn test_project_in_key_order() {
        let spec = KeySpec::new(["b", "a"]).unwrap();
        let r = record! { "a" => 1, "b" => "x", "c" => true };
        let k = spec.project(&r).unwrap();
        assert_eq!(k.values(), &[Value::from("x"), Value::Int(1)]);
    }

    #[test]
    fn test_project_missing_column() {
        let spec = KeySpec::new(["missing"]).unwrap();
        let err = spec.project(&record! { "a" => 1 }).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column } if column == "missing"));
    }

    #[test]
    fn test_tuple_lexicographic_order() {
        let a = KeyTuple::new(vec![Value::Int(1), Value::from("z")]);
        let b = KeyTuple::new(vec![Value::Int(2), Value::from("a")]);
        let c = KeyTuple::new(vec![Value::Int(2), Value::from("b")]);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_group_key_to_record() {
        let spec = KeySpec::new(["word", "doc"]).unwrap();
        let key = GroupKey::new(spec, KeyTuple::new(vec!["hi".into(), 3.into()]));
        assert_eq!(key.to_record(), record! { "word" => "hi", "doc" => 3 });
        assert_eq!(key.get("doc"), Some(&Value::Int(3)));
        assert_eq!(key.get("nope"), None);
    }
}
