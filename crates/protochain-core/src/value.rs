//! Value type for instance fields, method arguments and results
//!
//! Every variant except [`Value::Record`] is a plain value: cloning it
//! produces an independent copy. A `Record` is a shared handle, so cloning
//! it aliases the same storage and equality is identity.

use crate::error::{ChainError, Result};
use dashmap::DashMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Core value type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Nil/null value
    #[default]
    Nil,

    Boolean(bool),

    Integer(i64),

    Float(OrderedFloat<f64>),

    /// UTF-8 string
    String(String),

    /// Symbol (interned name, e.g. a conversion hint)
    Symbol(String),

    Array(Vec<Value>),

    /// Key-value map, copied on clone
    Map(BTreeMap<String, Value>),

    /// Key-value record, shared on clone
    Record(Record),
}

impl Value {
    /// Convert to boolean if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Nil => Some(false),
            _ => None,
        }
    }

    /// Convert to integer if possible
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => Some(f.into_inner() as i64),
            _ => None,
        }
    }

    /// Convert to float if possible
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(f.into_inner()),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Convert to string if possible
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Check if value is truthy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    /// Whether this value is a primitive (not a collection or record)
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Map(_) | Value::Record(_))
    }

    /// Whether `record` is this value or nested anywhere inside it
    pub fn reaches(&self, record: &Record) -> bool {
        match self {
            Value::Array(items) => items.iter().any(|v| v.reaches(record)),
            Value::Map(map) => map.values().any(|v| v.reaches(record)),
            Value::Record(r) => {
                r.ptr_eq(record) || r.0.iter().any(|entry| entry.value().reaches(record))
            }
            _ => false,
        }
    }

    /// Copy this value without sharing any record storage
    #[must_use]
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Array(items) => Value::Array(items.iter().map(Value::deep_copy).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy()))
                    .collect(),
            ),
            Value::Record(record) => Value::Record(record.deep_copy()),
            other => other.clone(),
        }
    }

    /// Type name for inspection
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Record(_) => "Record",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(fl) => write!(f, "{fl}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Symbol(s) => write!(f, "#{s}"),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => write_entries(f, map),
            Value::Record(record) => write_entries(f, &record.snapshot()),
        }
    }
}

fn write_entries(f: &mut fmt::Formatter<'_>, map: &BTreeMap<String, Value>) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (k, v)) in map.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{k}: {v}")?;
    }
    write!(f, "}}")
}

/// Shared, mutable key-value storage
///
/// Clones alias the same entries: a write through one handle is visible
/// through every other. Two records compare equal only when they are the
/// same allocation. A record never contains itself, directly or through
/// nested values: [`Record::set`] rejects such a write, since display,
/// copying and serialization all walk the entries recursively.
#[derive(Debug, Clone, Default)]
pub struct Record(Arc<DashMap<String, Value>>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.get(key).map(|v| v.clone())
    }

    /// Store `value` under `key`, returning the previous value
    ///
    /// Fails with [`ChainError::CyclicRecord`] if `value` is or reaches this record.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        let key = key.into();
        let value = value.into();
        if value.reaches(self) {
            return Err(ChainError::CyclicRecord { key });
        }
        Ok(self.0.insert(key, value))
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether both handles alias the same storage
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Sorted point-in-time copy of the entries
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.0
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// A new record holding deep copies of these entries
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        self.snapshot()
            .into_iter()
            .map(|(k, v)| (k, v.deep_copy()))
            .collect()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

// Conversions from Rust types
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(OrderedFloat(f))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(vec: Vec<T>) -> Self {
        Value::Array(vec.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(42).as_i64(), Some(42));
        assert_eq!(Value::from(3.5).as_f64(), Some(3.5));
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
    }

    #[test]
    fn test_truthy() {
        assert!(Value::from(true).is_truthy());
        assert!(Value::from(42).is_truthy());
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::from(false).is_truthy());
    }

    #[test]
    fn test_record_serializes_as_map() {
        let record = Record::new();
        record.set("counter", 0).unwrap();
        let json = serde_json::to_string(&Value::Record(record)).unwrap();
        assert_eq!(
            json,
            r#"{"type":"Record","value":{"counter":{"type":"Integer","value":0}}}"#
        );
    }
}
