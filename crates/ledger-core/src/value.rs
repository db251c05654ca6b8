//! Scalar value and data type model.
//!
//! `DataType` enumerates the closed set of column types. `Value` is the
//! runtime representation of a cell; coercion between the two is the only
//! place raw SQL literals become typed data.
//!
//! `TIMESTAMP` has no dedicated `Value` variant: per spec it is stored as an
//! opaque string, so a `TIMESTAMP` column's values are represented the same
//! way a `TEXT` column's are (`Value::Text`). The distinction lives only in
//! `DataType`, which governs what a bare string literal is allowed to feed.

use std::cmp::Ordering;
use std::fmt;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The closed set of column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int,
    Text,
    Float,
    Boolean,
    Timestamp,
}

impl DataType {
    /// Parse a data type from its SQL spelling, case-insensitively.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INT" => Some(DataType::Int),
            "TEXT" => Some(DataType::Text),
            "FLOAT" => Some(DataType::Float),
            "BOOLEAN" => Some(DataType::Boolean),
            "TIMESTAMP" => Some(DataType::Timestamp),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int => "INT",
            DataType::Text => "TEXT",
            DataType::Float => "FLOAT",
            DataType::Boolean => "BOOLEAN",
            DataType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A scalar runtime value, or the absence of one (NULL).
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Structural type name, for diagnostics.
    fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INT",
            Value::Float(_) => "FLOAT",
            Value::Text(_) => "TEXT",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
        }
    }

    /// Whether this value may be assigned to a column of `data_type`.
    ///
    /// NULL is always assignable (callers enforce the primary-key
    /// non-null rule separately). `INT` widens to `FLOAT`; strings are
    /// accepted for both `TEXT` and `TIMESTAMP`, since timestamps are
    /// stored as opaque strings.
    pub fn is_assignable_to(&self, data_type: DataType) -> bool {
        if self.is_null() {
            return true;
        }
        match (self, data_type) {
            (Value::Int(_), DataType::Int) => true,
            (Value::Int(_), DataType::Float) => true,
            (Value::Float(_), DataType::Float) => true,
            (Value::Text(_), DataType::Text) => true,
            (Value::Text(_), DataType::Timestamp) => true,
            (Value::Boolean(_), DataType::Boolean) => true,
            _ => false,
        }
    }

    /// Coerce this value into the representation used for a column of
    /// `data_type`. Returns an error describing the mismatch otherwise.
    pub fn coerce(&self, data_type: DataType) -> Result<Value, String> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        match data_type {
            DataType::Int => match self {
                Value::Int(i) => Ok(Value::Int(*i)),
                other => Err(format!("cannot convert {} to INT", other.type_name())),
            },
            DataType::Float => match self {
                Value::Int(i) => Ok(Value::Float(*i as f64)),
                Value::Float(f) => Ok(Value::Float(*f)),
                other => Err(format!("cannot convert {} to FLOAT", other.type_name())),
            },
            DataType::Text | DataType::Timestamp => match self {
                Value::Text(s) => Ok(Value::Text(s.clone())),
                other => Err(format!(
                    "cannot convert {} to {}",
                    other.type_name(),
                    data_type
                )),
            },
            DataType::Boolean => match self {
                Value::Boolean(b) => Ok(Value::Boolean(*b)),
                other => Err(format!("cannot convert {} to BOOLEAN", other.type_name())),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// Serializes to a plain JSON primitive, no type tag — `Value::Text` and
/// `Value::Timestamp` are therefore indistinguishable on disk, since a
/// timestamp is just an opaque string.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_none(),
        }
    }
}

/// Deserializes via an intermediate `serde_json::Value` so that JSON integers
/// and JSON floats round-trip to `Value::Int`/`Value::Float` exactly — a
/// plain `#[serde(untagged)]` enum would blur this distinction.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        match raw {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(b)),
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    if let Some(i) = n.as_i64() {
                        return Ok(Value::Int(i));
                    }
                }
                n.as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| DeError::custom("number out of range"))
            }
            other => Err(DeError::custom(format!(
                "unsupported JSON value in row: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_widens_to_float() {
        assert!(Value::Int(3).is_assignable_to(DataType::Float));
        assert_eq!(
            Value::Int(3).coerce(DataType::Float).unwrap(),
            Value::Float(3.0)
        );
    }

    #[test]
    fn text_assignable_to_timestamp() {
        assert!(Value::Text("2024-01-01".into()).is_assignable_to(DataType::Timestamp));
    }

    #[test]
    fn float_not_assignable_to_int() {
        assert!(!Value::Float(3.5).is_assignable_to(DataType::Int));
        assert!(Value::Float(3.5).coerce(DataType::Int).is_err());
    }

    #[test]
    fn null_always_assignable() {
        assert!(Value::Null.is_assignable_to(DataType::Int));
        assert!(Value::Null.is_assignable_to(DataType::Boolean));
    }

    #[test]
    fn boolean_coerces_and_rejects_other_types() {
        assert_eq!(
            Value::Boolean(true).coerce(DataType::Boolean).unwrap(),
            Value::Boolean(true)
        );
        assert!(Value::Int(1).coerce(DataType::Boolean).is_err());
        assert!(Value::Boolean(true).coerce(DataType::Int).is_err());
    }

    #[test]
    fn boolean_equality_and_ordering() {
        assert_eq!(Value::Boolean(true), Value::Boolean(true));
        assert_ne!(Value::Boolean(true), Value::Boolean(false));
        assert!(Value::Boolean(false) < Value::Boolean(true));
    }

    #[test]
    fn null_equals_null_but_not_non_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, Value::Int(0));
    }

    #[test]
    fn ordering_across_int_float() {
        assert!(Value::Int(1) < Value::Float(1.5));
    }

    #[test]
    fn ordering_undefined_across_types_is_none() {
        assert_eq!(Value::Int(1).partial_cmp(&Value::Text("a".into())), None);
    }

    #[test]
    fn json_round_trip_preserves_int_vs_float() {
        let int_json = serde_json::to_string(&Value::Int(10)).unwrap();
        let float_json = serde_json::to_string(&Value::Float(10.0)).unwrap();
        assert_ne!(int_json, float_json);
        assert_eq!(
            serde_json::from_str::<Value>(&int_json).unwrap(),
            Value::Int(10)
        );
        assert_eq!(
            serde_json::from_str::<Value>(&float_json).unwrap(),
            Value::Float(10.0)
        );
    }
}
