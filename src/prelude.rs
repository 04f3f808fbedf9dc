//! # proxyforge Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits of
//! the library. Import this module to get quick access to everything needed to describe a
//! target type, drive the contributor pipeline, and round-trip a synthesized instance.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all proxyforge operations
pub use crate::Error;

/// The result type used throughout proxyforge
pub use crate::Result;

// ================================================================================================
// Member Reference Model
// ================================================================================================

/// Target type description and its builder
pub use crate::metadata::{TargetType, TargetTypeBuilder};

/// Member descriptions and modifier flags
pub use crate::metadata::{
    AttributeDesc, ConstructorDesc, FieldDesc, FieldModifiers, MethodDesc, MethodModifiers,
    ParamKind, TypeAttributes,
};

/// Runtime values and instance state
pub use crate::metadata::{FieldMap, Value, ValueKind};

/// Serialization protocol identity
pub use crate::metadata::{GET_OBJECT_DATA, SERIALIZABLE_INTERFACE};

// ================================================================================================
// Serialization Boundary
// ================================================================================================

/// Payload and context types of the host serialization protocol
pub use crate::serialization::{ContextState, SerializationInfo, StreamingContext};

/// Reserved payload keys of synthesized types
pub use crate::serialization::{DATA_KEY, DELEGATE_KEY};

// ================================================================================================
// Code Assembly
// ================================================================================================

/// The type under construction and its frozen result
pub use crate::emit::{ClassEmitter, SynthesizedType};

/// Instruction algebra nodes
pub use crate::emit::{AssignTarget, Callee, Expression, FieldHandle, LocalHandle, Statement};

/// Names of the capability surface on synthesized types
pub use crate::emit::{DYN_PROXY_GET_TARGET, GET_INTERCEPTORS, INTERCEPTORS_FIELD};

// ================================================================================================
// Contributors and Pipeline
// ================================================================================================

/// The contributor role and its driver
pub use crate::contributors::{Contributor, ContributorPipeline};

/// The class instance contributor and its collaborators
pub use crate::contributors::{ClassInstanceContributor, MethodsToSkip, ProxyGenerationOptions};

// ================================================================================================
// Runtime Backend
// ================================================================================================

/// Live instances of synthesized types and the round-trip entry points
pub use crate::runtime::{reconstruct, serialize, ProxyInstance};
