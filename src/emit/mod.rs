//! # Emit Module
//!
//! The code assembly abstraction: an instruction algebra for method bodies
//! ([`Expression`] / [`Statement`]), imperative body accumulators ([`CodeBuilder`]), and the
//! type under construction ([`ClassEmitter`]) that freezes into a [`SynthesizedType`].
//!
//! Contributors consume this module to emit members and statements; they never decide how the
//! result is materialized. The interpreting backend lives in [`crate::runtime`].

mod ast;
mod class;
mod method;

pub use ast::{AssignTarget, Callee, Expression, FieldHandle, LocalHandle, Statement};
pub use class::{
    ClassEmitter, EmittedConstructor, EmittedMethod, SynthesizedType, DYN_PROXY_GET_TARGET,
    GET_INTERCEPTORS, INTERCEPTORS_FIELD,
};
pub use method::{CodeBuilder, ConstructorEmitter, MethodEmitter};
