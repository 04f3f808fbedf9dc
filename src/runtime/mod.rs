//! # Runtime Module
//!
//! Interpreting materialization backend for synthesized types.
//!
//! Emitted bodies are statement trees over the [`crate::emit`] algebra; this module walks them
//! against live instance state so a synthesized type can actually be instantiated, serialized
//! and reconstructed. [`serialize`] runs the emitted serialization entry point;
//! [`reconstruct`] is the strategy-dispatching reconstruction path that reads the reserved
//! strategy flag and either replays the emitted constructor or restores the generic
//! whole-object snapshot.
//!
//! Evaluation errors signal defects in emitted code, not caller mistakes; they use the same
//! crate [`Error`] as everything else.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::emit::{
    AssignTarget, Callee, Expression, LocalHandle, Statement, SynthesizedType,
    DYN_PROXY_GET_TARGET, GET_INTERCEPTORS, INTERCEPTORS_FIELD,
};
use crate::metadata::{FieldDesc, FieldMap, TargetType, Value, ValueKind, GET_OBJECT_DATA};
use crate::serialization::{
    populate_members, serializable_members, SerializationInfo, StreamingContext, DATA_KEY,
    DELEGATE_KEY,
};
use crate::{Error, Result};

/// A live instance of a synthesized type.
///
/// Holds the frozen type and one field map covering both the target's instance fields and the
/// fields the synthesized type declared for itself.
#[derive(Debug, Clone)]
pub struct ProxyInstance {
    ty: Arc<SynthesizedType>,
    fields: FieldMap,
}

impl ProxyInstance {
    /// Creates an instance with default field values and the given interceptor set.
    #[must_use]
    pub fn new(ty: Arc<SynthesizedType>, interceptors: Vec<Value>) -> Self {
        let mut fields = ty.default_fields();
        fields.set(INTERCEPTORS_FIELD, Value::Array(interceptors));
        ProxyInstance { ty, fields }
    }

    /// The synthesized type of this instance.
    #[must_use]
    pub fn ty(&self) -> &Arc<SynthesizedType> {
        &self.ty
    }

    /// The instance state.
    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Reads one field by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemberNotFound`] if the instance has no such field.
    pub fn field(&self, name: &str) -> Result<&Value> {
        self.fields.get(name)
    }

    /// Overwrites one existing field by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemberNotFound`] if the instance has no such field.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.fields.get(name)?;
        self.fields.set(name, value);
        Ok(())
    }

    /// Returns the interceptor set through the emitted capability accessor.
    ///
    /// # Errors
    ///
    /// Fails if the capability method was not emitted on this type.
    pub fn interceptors(&self) -> Result<Value> {
        match self.run_method(GET_INTERCEPTORS)? {
            Slot::Val(value) => Ok(value),
            other => Err(Error::InvalidCodeReference(format!(
                "{GET_INTERCEPTORS} returned {other:?} instead of a value"
            ))),
        }
    }

    /// Returns the real proxied target through the emitted capability accessor.
    ///
    /// Class proxies are their own target, so this resolves to the instance itself.
    ///
    /// # Errors
    ///
    /// Fails if the capability method was not emitted on this type.
    pub fn proxy_target(&self) -> Result<&ProxyInstance> {
        match self.run_method(DYN_PROXY_GET_TARGET)? {
            Slot::This => Ok(self),
            other => Err(Error::InvalidCodeReference(format!(
                "{DYN_PROXY_GET_TARGET} returned {other:?} instead of the instance"
            ))),
        }
    }

    fn run_method(&self, name: &str) -> Result<Slot> {
        let method = self
            .ty
            .method(name)
            .ok_or_else(|| Error::MemberNotFound(name.to_string()))?;
        let mut fields = self.fields.clone();
        let mut evaluator = Evaluator::new(&mut fields, Vec::new(), method.locals().len());
        evaluator.run(method.statements())
    }
}

/// Runs the emitted serialization entry point of an instance, writing into `info`.
///
/// # Errors
///
/// Fails if the type carries no emitted `GetObjectData`, or if the emitted body faults.
pub fn serialize(
    instance: &ProxyInstance,
    info: &mut SerializationInfo,
    context: StreamingContext,
) -> Result<()> {
    let method = instance
        .ty()
        .method(GET_OBJECT_DATA)
        .ok_or_else(|| Error::MemberNotFound(GET_OBJECT_DATA.to_string()))?;

    let shared = Rc::new(RefCell::new(std::mem::take(info)));
    let mut fields = instance.fields().clone();
    let result = {
        let args = vec![Slot::Info(Rc::clone(&shared)), Slot::Context(context)];
        let mut evaluator = Evaluator::new(&mut fields, args, method.locals().len());
        evaluator.run(method.statements()).map(|_| ())
    };

    *info = Rc::try_unwrap(shared)
        .map_err(|_| Error::Error("serialization payload is still shared".to_string()))?
        .into_inner();
    result
}

/// Reconstructs an instance of a synthesized type from a payload.
///
/// Reads the strategy flag under [`DELEGATE_KEY`]. When the payload was produced by the
/// delegate-to-base strategy, the emitted (serialization-info, streaming-context) constructor
/// replays base state and the recorded proxy fields. Otherwise the generic snapshot under
/// [`DATA_KEY`] is replayed over the target's serializable members, and proxy-declared fields
/// present in the payload are restored by name.
///
/// # Errors
///
/// Fails if the strategy flag is missing, if a delegate payload meets a type without an
/// emitted reconstruction constructor, or if replay faults.
pub fn reconstruct(
    ty: &Arc<SynthesizedType>,
    info: &SerializationInfo,
    context: StreamingContext,
) -> Result<ProxyInstance> {
    let delegated = matches!(
        info.get_value(DELEGATE_KEY, ValueKind::Bool)?,
        Value::Bool(true)
    );
    let mut fields = ty.default_fields();

    if delegated {
        let ctor = ty
            .reconstruction_constructor()
            .ok_or_else(|| Error::MissingReconstructionPath(ty.name().to_string()))?;
        let shared = Rc::new(RefCell::new(info.clone()));
        let args = vec![Slot::Info(shared), Slot::Context(context)];
        let mut evaluator = Evaluator::new(&mut fields, args, ctor.locals().len());
        evaluator.run(ctor.statements())?;
    } else {
        let members = serializable_members(ty.target());
        let Value::Array(data) = info.get_value(DATA_KEY, ValueKind::Array)? else {
            return Err(Error::PayloadEntryMissing(DATA_KEY.to_string()));
        };
        populate_members(&mut fields, &members, &data)?;
        for field in ty.fields() {
            if info.contains(field.name()) {
                fields.set(field.name(), info.get_value(field.name(), field.kind())?);
            }
        }
    }

    Ok(ProxyInstance {
        ty: ty.clone(),
        fields,
    })
}

/// One evaluated expression result.
///
/// Payload handles and member lists flow through evaluation but never into instance state,
/// so slots are distinct from [`Value`].
#[derive(Debug, Clone)]
enum Slot {
    Void,
    Val(Value),
    This,
    Type(Arc<TargetType>),
    Kind(ValueKind),
    Fields(Vec<Arc<FieldDesc>>),
    Info(Rc<RefCell<SerializationInfo>>),
    Context(StreamingContext),
}

enum Flow {
    Next,
    Return(Slot),
}

struct Evaluator<'a> {
    fields: &'a mut FieldMap,
    args: Vec<Slot>,
    locals: Vec<Slot>,
}

impl<'a> Evaluator<'a> {
    fn new(fields: &'a mut FieldMap, args: Vec<Slot>, local_count: usize) -> Self {
        Evaluator {
            fields,
            args,
            locals: vec![Slot::Void; local_count],
        }
    }

    fn run(&mut self, statements: &[Statement]) -> Result<Slot> {
        for statement in statements {
            if let Flow::Return(slot) = self.exec(statement)? {
                return Ok(slot);
            }
        }
        Ok(Slot::Void)
    }

    fn exec(&mut self, statement: &Statement) -> Result<Flow> {
        match statement {
            Statement::Eval(expr) => {
                self.eval(expr)?;
                Ok(Flow::Next)
            }
            Statement::Assign { target, value } => {
                let slot = self.eval(value)?;
                match target {
                    AssignTarget::Field(handle) => {
                        let value = expect_value(slot)?;
                        self.fields.set(handle.name(), value);
                    }
                    AssignTarget::Local(handle) => {
                        self.set_local(*handle, slot)?;
                    }
                }
                Ok(Flow::Next)
            }
            Statement::InvokeBaseConstructor { ctor, args } => {
                let (info, context) = self.eval_protocol_args(args)?;
                (ctor.body)(self.fields, &info.borrow(), context)?;
                Ok(Flow::Next)
            }
            Statement::Return(expr) => {
                let slot = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Slot::Void,
                };
                Ok(Flow::Return(slot))
            }
        }
    }

    fn eval(&mut self, expr: &Expression) -> Result<Slot> {
        match expr {
            Expression::Literal(value) => Ok(Slot::Val(value.clone())),
            Expression::This => Ok(Slot::This),
            Expression::Arg(index) => self
                .args
                .get(*index)
                .cloned()
                .ok_or_else(|| Error::InvalidCodeReference(format!("argument {index}"))),
            Expression::Local(handle) => self
                .locals
                .get(handle.index())
                .cloned()
                .ok_or_else(|| Error::InvalidCodeReference(format!("local {}", handle.index()))),
            Expression::Field(handle) => Ok(Slot::Val(self.fields.get(handle.name())?.clone())),
            Expression::TypeToken(ty) => Ok(Slot::Type(ty.clone())),
            Expression::KindToken(kind) => Ok(Slot::Kind(*kind)),
            Expression::Convert { to, expr } => {
                let value = expect_value(self.eval(expr)?)?;
                Ok(Slot::Val(value.convert_to(*to)?))
            }
            Expression::Invoke {
                callee,
                receiver,
                args,
            } => self.invoke(callee, receiver.as_deref(), args),
        }
    }

    fn invoke(
        &mut self,
        callee: &Callee,
        receiver: Option<&Expression>,
        args: &[Expression],
    ) -> Result<Slot> {
        let receiver = match receiver {
            Some(expr) => Some(self.eval(expr)?),
            None => None,
        };
        let mut slots = Vec::with_capacity(args.len());
        for arg in args {
            slots.push(self.eval(arg)?);
        }

        match callee {
            Callee::InfoAddValue => {
                let info = expect_info(receiver)?;
                let [name, value] = take_two(slots, "add_value")?;
                let name = expect_string(name)?;
                let value = expect_value(value)?;
                info.borrow_mut().add_value(&name, value)?;
                Ok(Slot::Void)
            }
            Callee::InfoGetValue => {
                let info = expect_info(receiver)?;
                let [name, kind] = take_two(slots, "get_value")?;
                let name = expect_string(name)?;
                let kind = expect_kind(kind)?;
                let value = info.borrow().get_value(&name, kind)?;
                Ok(Slot::Val(value))
            }
            Callee::MembersOf => {
                let [ty] = take_one(slots, "members_of")?;
                let Slot::Type(ty) = ty else {
                    return Err(Error::InvalidCodeReference(
                        "members_of expects a type token".to_string(),
                    ));
                };
                Ok(Slot::Fields(serializable_members(&ty)))
            }
            Callee::Snapshot => {
                let [this, members] = take_two(slots, "snapshot")?;
                if !matches!(this, Slot::This) {
                    return Err(Error::InvalidCodeReference(
                        "snapshot expects the instance as its first argument".to_string(),
                    ));
                }
                let Slot::Fields(members) = members else {
                    return Err(Error::InvalidCodeReference(
                        "snapshot expects a member list".to_string(),
                    ));
                };
                let data = crate::serialization::object_data(self.fields, &members)?;
                Ok(Slot::Val(Value::Array(data)))
            }
            Callee::BaseMethod(method) => {
                if !matches!(receiver, Some(Slot::This)) {
                    return Err(Error::InvalidCodeReference(format!(
                        "direct call to {} requires the instance receiver",
                        method.name
                    )));
                }
                let body = method.body.clone().ok_or_else(|| {
                    Error::InvalidCodeReference(format!("{} has no body to call", method.name))
                })?;
                let [info, context] = take_two(slots, &method.name)?;
                let info = expect_info(Some(info))?;
                let context = expect_context(context)?;
                body(self.fields, &mut info.borrow_mut(), context)?;
                Ok(Slot::Void)
            }
        }
    }

    fn eval_protocol_args(
        &mut self,
        args: &[Expression],
    ) -> Result<(Rc<RefCell<SerializationInfo>>, StreamingContext)> {
        let mut slots = Vec::with_capacity(args.len());
        for arg in args {
            slots.push(self.eval(arg)?);
        }
        let [info, context] = take_two(slots, "base constructor")?;
        Ok((expect_info(Some(info))?, expect_context(context)?))
    }

    fn set_local(&mut self, handle: LocalHandle, slot: Slot) -> Result<()> {
        let local = self
            .locals
            .get_mut(handle.index())
            .ok_or_else(|| Error::InvalidCodeReference(format!("local {}", handle.index())))?;
        *local = slot;
        Ok(())
    }
}

fn expect_value(slot: Slot) -> Result<Value> {
    match slot {
        Slot::Val(value) => Ok(value),
        other => Err(Error::InvalidCodeReference(format!(
            "expected a value, found {other:?}"
        ))),
    }
}

fn expect_string(slot: Slot) -> Result<String> {
    match expect_value(slot)? {
        Value::String(s) => Ok(s),
        other => Err(Error::KindMismatch {
            expected: ValueKind::String,
            found: other.kind(),
        }),
    }
}

fn expect_kind(slot: Slot) -> Result<ValueKind> {
    match slot {
        Slot::Kind(kind) => Ok(kind),
        other => Err(Error::InvalidCodeReference(format!(
            "expected a kind token, found {other:?}"
        ))),
    }
}

fn expect_info(slot: Option<Slot>) -> Result<Rc<RefCell<SerializationInfo>>> {
    match slot {
        Some(Slot::Info(info)) => Ok(info),
        other => Err(Error::InvalidCodeReference(format!(
            "expected the serialization payload, found {other:?}"
        ))),
    }
}

fn expect_context(slot: Slot) -> Result<StreamingContext> {
    match slot {
        Slot::Context(context) => Ok(context),
        other => Err(Error::InvalidCodeReference(format!(
            "expected the streaming context, found {other:?}"
        ))),
    }
}

fn take_one(slots: Vec<Slot>, what: &str) -> Result<[Slot; 1]> {
    <[Slot; 1]>::try_from(slots)
        .map_err(|_| Error::InvalidCodeReference(format!("{what} expects one argument")))
}

fn take_two(slots: Vec<Slot>, what: &str) -> Result<[Slot; 2]> {
    <[Slot; 2]>::try_from(slots)
        .map_err(|_| Error::InvalidCodeReference(format!("{what} expects two arguments")))
}
