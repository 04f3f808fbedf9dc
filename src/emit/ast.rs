//! Instruction algebra for emitted method bodies.
//!
//! Contributed logic is assembled as explicit statement trees over a small set of tagged
//! variants: field assignment, invocation, base-constructor invocation, value conversion and
//! return. The [`crate::runtime`] backend interprets this algebra; nothing here encodes how a
//! host runtime would materialize executable code.

use std::sync::Arc;

use crate::metadata::{ConstructorDesc, MethodDesc, TargetType, Value, ValueKind};

/// Handle to a field declared on the type under construction.
///
/// Carries the field's name and declared kind so a payload write can later be paired with a
/// strongly-typed read.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldHandle {
    name: Arc<str>,
    kind: ValueKind,
}

impl FieldHandle {
    pub(crate) fn new(name: &str, kind: ValueKind) -> Self {
        FieldHandle {
            name: Arc::from(name),
            kind,
        }
    }

    /// Logical name of the field.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind of the field.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

/// Handle to a local variable declared in a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalHandle(pub(crate) usize);

impl LocalHandle {
    /// Slot index of the local within its body.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The callable members emitted code may invoke.
///
/// This is the token boundary of the assembly abstraction: emitted bodies never hold raw
/// function pointers, only references to well-known protocol members or to members of the
/// target type.
#[derive(Debug, Clone)]
pub enum Callee {
    /// `add_value` on a serialization payload receiver
    InfoAddValue,
    /// `get_value` on a serialization payload receiver
    InfoGetValue,
    /// Static enumeration of a type's serializable members
    MembersOf,
    /// Static whole-object snapshot of an instance's member values
    Snapshot,
    /// Direct, non-virtual invocation of a target type method
    BaseMethod(Arc<MethodDesc>),
}

/// An expression node of the instruction algebra.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A constant value
    Literal(Value),
    /// The instance the body executes on
    This,
    /// A method or constructor argument by position
    Arg(usize),
    /// A declared local variable
    Local(LocalHandle),
    /// Read of a field on the instance
    Field(FieldHandle),
    /// A type reference usable as a static-call argument
    TypeToken(Arc<TargetType>),
    /// A kind reference driving a typed payload read
    KindToken(ValueKind),
    /// Invocation of a callable member
    Invoke {
        /// The member being invoked
        callee: Callee,
        /// Receiver expression; `None` for static callees
        receiver: Option<Box<Expression>>,
        /// Argument expressions, in call order
        args: Vec<Expression>,
    },
    /// Conversion of a value to a kind
    Convert {
        /// Kind to convert to
        to: ValueKind,
        /// Value being converted
        expr: Box<Expression>,
    },
}

/// Assignable location on the left side of an assignment statement.
#[derive(Debug, Clone)]
pub enum AssignTarget {
    /// A field on the instance
    Field(FieldHandle),
    /// A declared local variable
    Local(LocalHandle),
}

/// A statement node of the instruction algebra.
#[derive(Debug, Clone)]
pub enum Statement {
    /// Evaluate an expression for its effect
    Eval(Expression),
    /// Assign a value into a field or local
    Assign {
        /// Location being assigned
        target: AssignTarget,
        /// Value being stored
        value: Expression,
    },
    /// Invoke a constructor of the base type as the initialization step
    InvokeBaseConstructor {
        /// The base constructor to run
        ctor: Arc<ConstructorDesc>,
        /// Argument expressions, in call order
        args: Vec<Expression>,
    },
    /// Return from the body, optionally with a value
    Return(Option<Expression>),
}

impl Expression {
    /// Shorthand for a string literal, the common shape of payload-entry names.
    #[must_use]
    pub fn name(value: &str) -> Expression {
        Expression::Literal(Value::String(value.to_string()))
    }
}
