//! Runtime values and field storage for target and synthesized instances.
//!
//! Serialization payloads, field defaults and snapshot arrays all carry [`Value`]s. The
//! [`ValueKind`] of a value drives typed payload reads and the conversion step emitted in
//! reconstruction constructors.

use std::collections::HashMap;

use strum::Display;

use crate::{Error, Result};

/// The kind of a runtime [`Value`].
///
/// Kinds are deliberately coarse: the serialization contract only needs enough typing to pair a
/// payload write with a typed read. [`ValueKind::Object`] is the untyped catch-all used for
/// opaque locals and null defaults.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Boolean value
    Bool,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point value
    Float64,
    /// String value
    String,
    /// Ordered value array
    Array,
    /// Untyped value, matches anything
    Object,
}

/// A runtime value stored in an instance field or a serialization payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point value
    Float64(f64),
    /// String value
    String(String),
    /// Ordered value array
    Array(Vec<Value>),
}

impl Value {
    /// Returns the kind of this value. [`Value::Null`] reports [`ValueKind::Object`].
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Object,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float64(_) => ValueKind::Float64,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
        }
    }

    /// Returns the zero value of the given kind, used to seed declared fields without an
    /// explicit default.
    #[must_use]
    pub fn default_of(kind: ValueKind) -> Value {
        match kind {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int32 => Value::Int32(0),
            ValueKind::Int64 => Value::Int64(0),
            ValueKind::Float64 => Value::Float64(0.0),
            ValueKind::String => Value::String(String::new()),
            ValueKind::Array => Value::Array(Vec::new()),
            ValueKind::Object => Value::Null,
        }
    }

    /// Converts this value to the requested kind.
    ///
    /// Exact kind matches pass through unchanged, integers widen (`Int32` to `Int64` or
    /// `Float64`), and [`ValueKind::Object`] accepts anything. Every other combination is a
    /// [`Error::KindMismatch`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::KindMismatch`] if the value cannot represent the requested kind.
    pub fn convert_to(&self, kind: ValueKind) -> Result<Value> {
        if kind == ValueKind::Object || self.kind() == kind {
            return Ok(self.clone());
        }

        match (self, kind) {
            (Value::Int32(v), ValueKind::Int64) => Ok(Value::Int64(i64::from(*v))),
            (Value::Int32(v), ValueKind::Float64) => Ok(Value::Float64(f64::from(*v))),
            _ => Err(Error::KindMismatch {
                expected: kind,
                found: self.kind(),
            }),
        }
    }
}

/// Mutable field storage of one instance, keyed by field name.
///
/// Both the native bodies of a target type and the statement evaluator read and write instance
/// state through this map. Ordering concerns never live here; any ordered traversal is driven by
/// a member list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    slots: HashMap<String, Value>,
}

impl FieldMap {
    /// Creates an empty field map.
    #[must_use]
    pub fn new() -> Self {
        FieldMap::default()
    }

    /// Stores `value` under `name`, creating or replacing the slot.
    pub fn set(&mut self, name: &str, value: Value) {
        self.slots.insert(name.to_string(), value);
    }

    /// Returns the value stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemberNotFound`] if no slot with that name exists.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.slots
            .get(name)
            .ok_or_else(|| Error::MemberNotFound(name.to_string()))
    }

    /// Returns true if a slot with the given name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Number of slots in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the map holds no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::Bool(true).kind(), ValueKind::Bool);
        assert_eq!(Value::Float64(1.5).kind(), ValueKind::Float64);
        assert_eq!(Value::Null.kind(), ValueKind::Object);
        assert_eq!(Value::Array(vec![Value::Int32(1)]).kind(), ValueKind::Array);
    }

    #[test]
    fn test_convert_exact_and_widening() -> Result<()> {
        assert_eq!(
            Value::Int32(7).convert_to(ValueKind::Int32)?,
            Value::Int32(7)
        );
        assert_eq!(
            Value::Int32(7).convert_to(ValueKind::Int64)?,
            Value::Int64(7)
        );
        assert_eq!(
            Value::Int32(7).convert_to(ValueKind::Float64)?,
            Value::Float64(7.0)
        );
        assert_eq!(Value::Null.convert_to(ValueKind::Object)?, Value::Null);
        Ok(())
    }

    #[test]
    fn test_convert_mismatch() {
        let result = Value::String("x".into()).convert_to(ValueKind::Bool);
        assert!(matches!(
            result,
            Err(Error::KindMismatch {
                expected: ValueKind::Bool,
                found: ValueKind::String
            })
        ));
    }

    #[test]
    fn test_field_map_roundtrip() -> Result<()> {
        let mut fields = FieldMap::new();
        assert!(fields.is_empty());

        fields.set("Balance", Value::Float64(42.5));
        assert_eq!(fields.get("Balance")?, &Value::Float64(42.5));
        assert!(fields.contains("Balance"));
        assert_eq!(fields.len(), 1);

        assert!(matches!(
            fields.get("Missing"),
            Err(Error::MemberNotFound(_))
        ));
        Ok(())
    }
}
