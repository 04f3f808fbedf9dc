//! # Metadata Module
//!
//! Read-only member reference model consumed by the synthesis pipeline: target type
//! descriptions, member flags, and the runtime values their instances carry.
//!
//! The contributor layer never owns this model; it inspects a shared [`TargetType`] during
//! analysis and references its members from emitted code.

mod types;
mod value;

pub use types::{
    non_inheritable_attributes, AttributeDesc, ConstructorDesc, EntryPointBody, FieldDesc,
    FieldModifiers, MethodDesc, MethodModifiers, ParamKind, ReconstructionBody, TargetType,
    TargetTypeBuilder, TypeAttributes, GET_OBJECT_DATA, SERIALIZABLE_INTERFACE,
};
pub use value::{FieldMap, Value, ValueKind};
