//! # Serialization Module
//!
//! The host serialization protocol at the boundary of the synthesis pipeline: the payload a
//! type writes itself into ([`SerializationInfo`]), the context it is handed
//! ([`StreamingContext`]), the reserved payload keys of synthesized types, and the generic
//! member enumeration and snapshot services used by the reflect-and-replay strategy.
//!
//! # Wire Contract
//!
//! A synthesized type's payload always contains a boolean entry under [`DELEGATE_KEY`]
//! recording which serialization strategy produced it. Payloads of the reflect-and-replay
//! strategy additionally carry the whole-object snapshot under [`DATA_KEY`]. Both keys are
//! stable across a save/reload cycle.

use std::sync::Arc;

use crate::metadata::{FieldDesc, FieldMap, FieldModifiers, TargetType, Value, ValueKind};
use crate::{Error, Result};

/// Reserved payload key recording which serialization strategy was used.
pub const DELEGATE_KEY: &str = "__delegateToBase";

/// Reserved payload key holding the opaque whole-object snapshot.
pub const DATA_KEY: &str = "__data";

/// Destination a serialized payload is headed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextState {
    /// Any destination
    #[default]
    All,
    /// Durable storage
    Persistence,
    /// Another process on the same machine
    CrossProcess,
    /// Another machine
    CrossMachine,
}

/// Context describing the source or destination of a serialization pass.
///
/// Carried through entry points and reconstruction constructors untouched; this library never
/// branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamingContext {
    /// Destination classification
    pub state: ContextState,
}

/// An insertion-ordered, name-keyed serialization payload.
///
/// Writes and reads pair up by name; iteration order is insertion order, and equality is
/// order-sensitive, so two payloads compare equal exactly when a save/reload cycle reproduced
/// the same entries in the same sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializationInfo {
    entries: Vec<(String, Value)>,
}

impl SerializationInfo {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        SerializationInfo::default()
    }

    /// Appends a named value to the payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePayloadEntry`] if an entry with the same name already exists;
    /// a payload never holds two values under one name.
    pub fn add_value(&mut self, name: &str, value: Value) -> Result<()> {
        if self.contains(name) {
            return Err(Error::DuplicatePayloadEntry(name.to_string()));
        }
        self.entries.push((name.to_string(), value));
        Ok(())
    }

    /// Reads a named value back out of the payload, converted to the requested kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadEntryMissing`] if no entry with that name exists, or
    /// [`Error::KindMismatch`] if the stored value cannot represent the requested kind.
    pub fn get_value(&self, name: &str, kind: ValueKind) -> Result<Value> {
        let (_, value) = self
            .entries
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| Error::PayloadEntryMissing(name.to_string()))?;
        value.convert_to(kind)
    }

    /// Returns true if the payload holds an entry with the given name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Number of entries in the payload.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the payload holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// Enumerates the serializable instance members of a target type, in declaration order.
///
/// Static fields and fields marked [`FieldModifiers::NOT_SERIALIZED`] are skipped. This is the
/// member list both sides of the reflect-and-replay strategy traverse, so its order is part of
/// the snapshot contract.
#[must_use]
pub fn serializable_members(ty: &TargetType) -> Vec<Arc<FieldDesc>> {
    ty.fields()
        .iter()
        .filter(|f| {
            !f.modifiers
                .intersects(FieldModifiers::STATIC | FieldModifiers::NOT_SERIALIZED)
        })
        .cloned()
        .collect()
}

/// Captures the current values of the given members as a flat snapshot array.
///
/// # Errors
///
/// Returns [`Error::MemberNotFound`] if the instance state lacks a slot for one of the members.
pub fn object_data(fields: &FieldMap, members: &[Arc<FieldDesc>]) -> Result<Vec<Value>> {
    members
        .iter()
        .map(|m| fields.get(&m.name).cloned())
        .collect()
}

/// Replays a snapshot array over the given members, symmetric to [`object_data`].
///
/// # Errors
///
/// Returns [`Error::SnapshotMismatch`] if the snapshot length differs from the member count,
/// or [`Error::KindMismatch`] if a snapshot value cannot represent its member's declared kind.
pub fn populate_members(
    fields: &mut FieldMap,
    members: &[Arc<FieldDesc>],
    data: &[Value],
) -> Result<()> {
    if members.len() != data.len() {
        return Err(Error::SnapshotMismatch {
            expected: members.len(),
            found: data.len(),
        });
    }
    for (member, value) in members.iter().zip(data) {
        fields.set(&member.name, value.convert_to(member.kind)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TargetTypeBuilder;

    #[test]
    fn test_payload_write_read() -> Result<()> {
        let mut info = SerializationInfo::new();
        info.add_value("Balance", Value::Float64(42.5))?;
        info.add_value(DELEGATE_KEY, Value::Bool(true))?;

        assert_eq!(
            info.get_value("Balance", ValueKind::Float64)?,
            Value::Float64(42.5)
        );
        assert_eq!(
            info.get_value(DELEGATE_KEY, ValueKind::Bool)?,
            Value::Bool(true)
        );
        assert_eq!(info.len(), 2);
        Ok(())
    }

    #[test]
    fn test_payload_duplicate_entry() -> Result<()> {
        let mut info = SerializationInfo::new();
        info.add_value("X", Value::Int32(1))?;
        assert!(matches!(
            info.add_value("X", Value::Int32(2)),
            Err(Error::DuplicatePayloadEntry(_))
        ));
        Ok(())
    }

    #[test]
    fn test_payload_missing_entry() {
        let info = SerializationInfo::new();
        assert!(matches!(
            info.get_value("Missing", ValueKind::Bool),
            Err(Error::PayloadEntryMissing(_))
        ));
    }

    #[test]
    fn test_payload_equality_is_order_sensitive() -> Result<()> {
        let mut a = SerializationInfo::new();
        a.add_value("X", Value::Int32(1))?;
        a.add_value("Y", Value::Int32(2))?;

        let mut b = SerializationInfo::new();
        b.add_value("Y", Value::Int32(2))?;
        b.add_value("X", Value::Int32(1))?;

        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn test_serializable_members_filtering() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Point")
            .serializable()
            .field("X", ValueKind::Int32)
            .field_with(
                "Origin",
                ValueKind::Int32,
                FieldModifiers::PUBLIC | FieldModifiers::STATIC,
                Value::Int32(0),
            )
            .field_with(
                "Cache",
                ValueKind::Array,
                FieldModifiers::PUBLIC | FieldModifiers::NOT_SERIALIZED,
                Value::Array(Vec::new()),
            )
            .field("Y", ValueKind::Int32)
            .build()?;

        let members = serializable_members(&target);
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["X", "Y"]);
        Ok(())
    }

    #[test]
    fn test_snapshot_roundtrip() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Point")
            .field("X", ValueKind::Int32)
            .field("Y", ValueKind::Int32)
            .build()?;
        let members = serializable_members(&target);

        let mut fields = target.default_fields();
        fields.set("X", Value::Int32(3));
        fields.set("Y", Value::Int32(-4));

        let data = object_data(&fields, &members)?;
        assert_eq!(data, vec![Value::Int32(3), Value::Int32(-4)]);

        let mut restored = target.default_fields();
        populate_members(&mut restored, &members, &data)?;
        assert_eq!(restored, fields);
        Ok(())
    }

    #[test]
    fn test_snapshot_arity_mismatch() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Point")
            .field("X", ValueKind::Int32)
            .build()?;
        let members = serializable_members(&target);
        let mut fields = target.default_fields();

        let result = populate_members(&mut fields, &members, &[]);
        assert!(matches!(
            result,
            Err(Error::SnapshotMismatch {
                expected: 1,
                found: 0
            })
        ));
        Ok(())
    }
}
