//! Member reference model for target types.
//!
//! This module defines the read-only description of the pre-existing type being proxied:
//! [`TargetType`] with its fields, methods, constructors and custom attributes, plus the
//! bitflags used to classify members the way the host runtime does.
//!
//! # Key Types
//! - [`TargetType`], [`TargetTypeBuilder`]: immutable type description and its fluent builder
//! - [`FieldDesc`], [`MethodDesc`], [`ConstructorDesc`], [`AttributeDesc`]: member descriptions
//! - [`TypeAttributes`], [`MethodModifiers`], [`FieldModifiers`]: attribute flags
//!
//! A target type claiming the serialization protocol carries native bodies for its entry point
//! and its reconstruction constructor; these stand in for the compiled code the host runtime
//! would dispatch into, and are what the synthesized proxy delegates to at run time.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::metadata::{FieldMap, Value, ValueKind};
use crate::serialization::{SerializationInfo, StreamingContext};
use crate::{Error, Result};

/// Full name of the serialization protocol interface a target type opts into.
pub const SERIALIZABLE_INTERFACE: &str = "System.Runtime.Serialization.ISerializable";

/// Name of the serialization protocol entry-point method.
pub const GET_OBJECT_DATA: &str = "GetObjectData";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Type-level attribute flags of a target type
    pub struct TypeAttributes: u32 {
        /// Type is visible outside its assembly
        const PUBLIC = 0x0001;
        /// Type cannot be subclassed further
        const SEALED = 0x0100;
        /// Type is marked serializable
        const SERIALIZABLE = 0x2000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method modifier flags relevant to override analysis
    pub struct MethodModifiers: u32 {
        /// Accessible only by the declaring type; an explicit interface implementation
        const PRIVATE = 0x0001;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method participates in virtual dispatch
        const VIRTUAL = 0x0040;
    }
}

impl MethodModifiers {
    /// Returns true if a subtype may declare an override of a method with these modifiers.
    ///
    /// A method is overridable when it is virtual, not final, and not a private explicit
    /// interface implementation.
    #[must_use]
    pub fn is_overridable(&self) -> bool {
        self.contains(MethodModifiers::VIRTUAL)
            && !self.contains(MethodModifiers::FINAL)
            && !self.contains(MethodModifiers::PRIVATE)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Field modifier flags relevant to member enumeration
    pub struct FieldModifiers: u32 {
        /// Field is accessible from anywhere
        const PUBLIC = 0x0006;
        /// Field belongs to the type rather than to instances
        const STATIC = 0x0010;
        /// Field is excluded from serialization
        const NOT_SERIALIZED = 0x0080;
    }
}

/// Native implementation of a target type's serialization entry point.
///
/// Receives the instance state, the payload being written, and the streaming context.
pub type EntryPointBody =
    Arc<dyn Fn(&FieldMap, &mut SerializationInfo, StreamingContext) -> Result<()> + Send + Sync>;

/// Native implementation of a target type's reconstruction constructor.
///
/// Receives the instance state being initialized, the payload being read, and the streaming
/// context.
pub type ReconstructionBody =
    Arc<dyn Fn(&mut FieldMap, &SerializationInfo, StreamingContext) -> Result<()> + Send + Sync>;

/// Parameter classification used in method and constructor signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// The serialization payload parameter
    Info,
    /// The streaming context parameter
    Context,
    /// A plain value parameter of the given kind
    Value(ValueKind),
}

/// Description of one instance field of a target type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDesc {
    /// Field name, unique within its declaring type
    pub name: String,
    /// Declared value kind
    pub kind: ValueKind,
    /// Modifier flags
    pub modifiers: FieldModifiers,
    /// Value a fresh instance starts out with
    pub default: Value,
}

/// Description of one method of a target type.
#[derive(Clone)]
pub struct MethodDesc {
    /// Method name, unique within its declaring type
    pub name: String,
    /// Modifier flags driving override analysis
    pub modifiers: MethodModifiers,
    /// Parameter signature
    pub params: Vec<ParamKind>,
    /// Native body, present only on the serialization entry point
    pub body: Option<EntryPointBody>,
}

impl fmt::Debug for MethodDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDesc")
            .field("name", &self.name)
            .field("modifiers", &self.modifiers)
            .field("params", &self.params)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Description of one constructor of a target type.
#[derive(Clone)]
pub struct ConstructorDesc {
    /// Parameter signature
    pub params: Vec<ParamKind>,
    /// Native body initializing the instance state
    pub body: ReconstructionBody,
}

impl ConstructorDesc {
    /// Returns true if this is the two-argument (serialization-info, streaming-context)
    /// reconstruction constructor.
    #[must_use]
    pub fn is_reconstruction(&self) -> bool {
        self.params == [ParamKind::Info, ParamKind::Context]
    }
}

impl fmt::Debug for ConstructorDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDesc")
            .field("params", &self.params)
            .finish()
    }
}

/// One custom attribute applied to a target type.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDesc {
    /// Full name of the attribute type
    pub type_name: String,
    /// Constructor arguments of the attribute
    pub args: Vec<Value>,
    /// True if the attribute flows to subtypes on its own
    pub inherited: bool,
}

/// Immutable description of the pre-existing type being proxied.
///
/// A `TargetType` is the origin of all serialization obligations of the synthesized subtype:
/// whether it is marked serializable, whether it implements the serialization protocol itself,
/// and which members a generic snapshot enumerates. Construct instances through
/// [`TargetTypeBuilder`] and share them as `Arc<TargetType>`.
#[derive(Debug)]
pub struct TargetType {
    name: String,
    flags: TypeAttributes,
    interfaces: Vec<String>,
    fields: Vec<Arc<FieldDesc>>,
    methods: Vec<Arc<MethodDesc>>,
    constructors: Vec<Arc<ConstructorDesc>>,
    attributes: Vec<AttributeDesc>,
}

impl TargetType {
    /// Full name of the type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type-level attribute flags.
    #[must_use]
    pub fn flags(&self) -> TypeAttributes {
        self.flags
    }

    /// Instance fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Arc<FieldDesc>] {
        &self.fields
    }

    /// Methods, in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[Arc<MethodDesc>] {
        &self.methods
    }

    /// Custom attributes applied to the type.
    #[must_use]
    pub fn custom_attributes(&self) -> &[AttributeDesc] {
        &self.attributes
    }

    /// True if the type carries the serializable marker.
    #[must_use]
    pub fn is_serializable(&self) -> bool {
        self.flags.contains(TypeAttributes::SERIALIZABLE)
    }

    /// True if the type declares the given interface.
    #[must_use]
    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Arc<MethodDesc>> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Arc<FieldDesc>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the two-argument reconstruction constructor, if the type provides one.
    #[must_use]
    pub fn serialization_constructor(&self) -> Option<&Arc<ConstructorDesc>> {
        self.constructors.iter().find(|c| c.is_reconstruction())
    }

    /// Seeds a fresh field map with the declared defaults of all instance fields.
    #[must_use]
    pub fn default_fields(&self) -> FieldMap {
        let mut map = FieldMap::new();
        for field in &self.fields {
            if !field.modifiers.contains(FieldModifiers::STATIC) {
                map.set(&field.name, field.default.clone());
            }
        }
        map
    }
}

/// Returns the custom attributes of a target type that do not flow to subtypes on their own.
///
/// These are exactly the attributes a synthesized subtype must replicate so that
/// reflection-based consumers observe equivalent metadata on it.
#[must_use]
pub fn non_inheritable_attributes(ty: &TargetType) -> Vec<AttributeDesc> {
    ty.custom_attributes()
        .iter()
        .filter(|a| !a.inherited)
        .cloned()
        .collect()
}

/// Builder for creating [`TargetType`] descriptions.
///
/// Provides a fluent API for assembling the type description a contributor analyzes. Validation
/// happens at [`build()`](TargetTypeBuilder::build): member names must be unique.
///
/// # Examples
///
/// ```rust
/// use proxyforge::metadata::{TargetTypeBuilder, Value, ValueKind};
///
/// let target = TargetTypeBuilder::new("MyApp.Point")
///     .serializable()
///     .field("X", ValueKind::Int32)
///     .field("Y", ValueKind::Int32)
///     .build()?;
///
/// assert!(target.is_serializable());
/// assert_eq!(target.fields().len(), 2);
/// # Ok::<(), proxyforge::Error>(())
/// ```
pub struct TargetTypeBuilder {
    name: String,
    flags: TypeAttributes,
    interfaces: Vec<String>,
    fields: Vec<FieldDesc>,
    methods: Vec<MethodDesc>,
    constructors: Vec<ConstructorDesc>,
    attributes: Vec<AttributeDesc>,
}

impl TargetTypeBuilder {
    /// Creates a builder for a type with the given full name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        TargetTypeBuilder {
            name: name.into(),
            flags: TypeAttributes::PUBLIC,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Replaces the type-level attribute flags.
    #[must_use]
    pub fn flags(mut self, flags: TypeAttributes) -> Self {
        self.flags = flags;
        self
    }

    /// Marks the type serializable.
    #[must_use]
    pub fn serializable(mut self) -> Self {
        self.flags |= TypeAttributes::SERIALIZABLE;
        self
    }

    /// Declares the type as implementing the given interface.
    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Adds a public instance field of the given kind, defaulted to its zero value.
    #[must_use]
    pub fn field(self, name: impl Into<String>, kind: ValueKind) -> Self {
        let default = Value::default_of(kind);
        self.field_with(name, kind, FieldModifiers::PUBLIC, default)
    }

    /// Adds a field with explicit modifiers and default value.
    #[must_use]
    pub fn field_with(
        mut self,
        name: impl Into<String>,
        kind: ValueKind,
        modifiers: FieldModifiers,
        default: Value,
    ) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            kind,
            modifiers,
            default,
        });
        self
    }

    /// Adds a plain method without a native body.
    #[must_use]
    pub fn method(
        mut self,
        name: impl Into<String>,
        modifiers: MethodModifiers,
        params: Vec<ParamKind>,
    ) -> Self {
        self.methods.push(MethodDesc {
            name: name.into(),
            modifiers,
            params,
            body: None,
        });
        self
    }

    /// Adds a custom attribute without arguments.
    #[must_use]
    pub fn attribute(mut self, type_name: impl Into<String>, inherited: bool) -> Self {
        self.attributes.push(AttributeDesc {
            type_name: type_name.into(),
            args: Vec::new(),
            inherited,
        });
        self
    }

    /// Adds a constructor with the given signature and native body.
    #[must_use]
    pub fn constructor(mut self, params: Vec<ParamKind>, body: ReconstructionBody) -> Self {
        self.constructors.push(ConstructorDesc { params, body });
        self
    }

    /// Declares the serialization protocol interface together with an entry-point method
    /// carrying the given modifiers and native body.
    ///
    /// Use [`MethodModifiers::VIRTUAL`] for a well-behaved target; non-virtual, final or
    /// private modifiers model the incompatible shapes the contributor rejects.
    #[must_use]
    pub fn serializable_protocol(mut self, modifiers: MethodModifiers, body: EntryPointBody) -> Self {
        self.interfaces.push(SERIALIZABLE_INTERFACE.to_string());
        self.methods.push(MethodDesc {
            name: GET_OBJECT_DATA.to_string(),
            modifiers,
            params: vec![ParamKind::Info, ParamKind::Context],
            body: Some(body),
        });
        self
    }

    /// Adds the two-argument reconstruction constructor paired with the entry point.
    #[must_use]
    pub fn reconstruction_constructor(self, body: ReconstructionBody) -> Self {
        self.constructor(vec![ParamKind::Info, ParamKind::Context], body)
    }

    /// Builds the immutable [`TargetType`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMember`] if two fields or two methods share a name, and
    /// [`Error::Error`] if the type name is empty.
    pub fn build(self) -> Result<Arc<TargetType>> {
        if self.name.is_empty() {
            return Err(Error::Error("Target type name cannot be empty".to_string()));
        }

        for (index, field) in self.fields.iter().enumerate() {
            if self.fields[..index].iter().any(|f| f.name == field.name) {
                return Err(Error::DuplicateMember(field.name.clone()));
            }
        }
        for (index, method) in self.methods.iter().enumerate() {
            if self.methods[..index].iter().any(|m| m.name == method.name) {
                return Err(Error::DuplicateMember(method.name.clone()));
            }
        }

        Ok(Arc::new(TargetType {
            name: self.name,
            flags: self.flags,
            interfaces: self.interfaces,
            fields: self.fields.into_iter().map(Arc::new).collect(),
            methods: self.methods.into_iter().map(Arc::new).collect(),
            constructors: self.constructors.into_iter().map(Arc::new).collect(),
            attributes: self.attributes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Account")
            .serializable()
            .field("Balance", ValueKind::Float64)
            .attribute("MyApp.AuditedAttribute", false)
            .build()?;

        assert_eq!(target.name(), "MyApp.Account");
        assert!(target.is_serializable());
        assert!(!target.implements(SERIALIZABLE_INTERFACE));
        assert_eq!(target.field("Balance").unwrap().kind, ValueKind::Float64);
        assert!(target.method(GET_OBJECT_DATA).is_none());
        Ok(())
    }

    #[test]
    fn test_builder_duplicate_field() {
        let result = TargetTypeBuilder::new("MyApp.Dup")
            .field("X", ValueKind::Int32)
            .field("X", ValueKind::Int64)
            .build();
        assert!(matches!(result, Err(Error::DuplicateMember(name)) if name == "X"));
    }

    #[test]
    fn test_builder_empty_name() {
        let result = TargetTypeBuilder::new("").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_serializable_protocol_wiring() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Account")
            .serializable()
            .field("Balance", ValueKind::Float64)
            .serializable_protocol(
                MethodModifiers::VIRTUAL,
                Arc::new(|fields, info, _| {
                    info.add_value("Balance", fields.get("Balance")?.clone())
                }),
            )
            .reconstruction_constructor(Arc::new(|fields, info, _| {
                fields.set("Balance", info.get_value("Balance", ValueKind::Float64)?);
                Ok(())
            }))
            .build()?;

        assert!(target.implements(SERIALIZABLE_INTERFACE));
        let entry = target.method(GET_OBJECT_DATA).unwrap();
        assert!(entry.modifiers.is_overridable());
        assert!(entry.body.is_some());
        assert!(target.serialization_constructor().is_some());
        Ok(())
    }

    #[test]
    fn test_overridable_modifiers() {
        assert!(MethodModifiers::VIRTUAL.is_overridable());
        assert!(!(MethodModifiers::VIRTUAL | MethodModifiers::FINAL).is_overridable());
        assert!(!(MethodModifiers::VIRTUAL | MethodModifiers::PRIVATE).is_overridable());
        assert!(!MethodModifiers::empty().is_overridable());
    }

    #[test]
    fn test_non_inheritable_attributes() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Attributed")
            .attribute("MyApp.AuditedAttribute", false)
            .attribute("MyApp.ObsoleteAttribute", true)
            .attribute("MyApp.DisplayAttribute", false)
            .build()?;

        let copied = non_inheritable_attributes(&target);
        assert_eq!(copied.len(), 2);
        assert_eq!(copied[0].type_name, "MyApp.AuditedAttribute");
        assert_eq!(copied[1].type_name, "MyApp.DisplayAttribute");
        Ok(())
    }

    #[test]
    fn test_default_fields_skip_static() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.WithStatic")
            .field("X", ValueKind::Int32)
            .field_with(
                "Counter",
                ValueKind::Int32,
                FieldModifiers::PUBLIC | FieldModifiers::STATIC,
                Value::Int32(9),
            )
            .build()?;

        let fields = target.default_fields();
        assert!(fields.contains("X"));
        assert!(!fields.contains("Counter"));
        Ok(())
    }
}
