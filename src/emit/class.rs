//! The type under construction and its frozen result.
//!
//! A [`ClassEmitter`] is owned exclusively by the generation pipeline while contributors mutate
//! it; [`ClassEmitter::build`] consumes the emitter and produces the immutable
//! [`SynthesizedType`] the runtime backend instantiates.

use std::sync::Arc;

use crate::emit::ast::{FieldHandle, Statement};
use crate::emit::method::{ConstructorEmitter, MethodEmitter};
use crate::metadata::{AttributeDesc, ParamKind, TargetType, Value, ValueKind};
use crate::{Error, Result};

/// Name of the field holding the interceptor set of a synthesized instance.
///
/// Declared by the type shell before any contributor runs.
pub const INTERCEPTORS_FIELD: &str = "__interceptors";

/// Name of the emitted capability method exposing the interceptor set.
pub const GET_INTERCEPTORS: &str = "GetInterceptors";

/// Name of the emitted capability method exposing the real proxied target.
pub const DYN_PROXY_GET_TARGET: &str = "DynProxyGetTarget";

/// The synthesized subtype while it is being assembled.
///
/// Created over the target type with the synthesized type's name; the shell declares the
/// [`INTERCEPTORS_FIELD`] so contributors can reference it. Contributors add fields, method
/// overrides, constructors and replicated attributes, then the driver freezes the type with
/// [`build()`](ClassEmitter::build).
#[derive(Debug)]
pub struct ClassEmitter {
    name: String,
    target: Arc<TargetType>,
    fields: Vec<FieldHandle>,
    methods: Vec<MethodEmitter>,
    constructors: Vec<ConstructorEmitter>,
    attributes: Vec<AttributeDesc>,
}

impl ClassEmitter {
    /// Creates the shell of a synthesized subtype of `target`.
    #[must_use]
    pub fn new(name: impl Into<String>, target: Arc<TargetType>) -> Self {
        let mut emitter = ClassEmitter {
            name: name.into(),
            target,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            attributes: Vec::new(),
        };
        emitter
            .fields
            .push(FieldHandle::new(INTERCEPTORS_FIELD, ValueKind::Array));
        emitter
    }

    /// Name of the synthesized type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type being proxied.
    #[must_use]
    pub fn target(&self) -> &Arc<TargetType> {
        &self.target
    }

    /// Fields declared on the synthesized type itself, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldHandle] {
        &self.fields
    }

    /// Declares a new field on the synthesized type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMember`] if the name collides with an already declared field
    /// or with a field of the target type.
    pub fn create_field(&mut self, name: &str, kind: ValueKind) -> Result<FieldHandle> {
        if self.get_field(name).is_some() || self.target.field(name).is_some() {
            return Err(Error::DuplicateMember(name.to_string()));
        }
        let handle = FieldHandle::new(name, kind);
        self.fields.push(handle.clone());
        Ok(handle)
    }

    /// Looks up a declared field by logical name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<FieldHandle> {
        self.fields.iter().find(|f| f.name() == name).cloned()
    }

    /// Declares a method with the given signature and returns its emitter.
    ///
    /// When the target type has a method of the same name, the declaration is an override of
    /// it; otherwise it is a fresh member of the synthesized type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMember`] if a method of that name was already declared here.
    pub fn create_method(
        &mut self,
        name: &str,
        params: Vec<ParamKind>,
    ) -> Result<&mut MethodEmitter> {
        if self.methods.iter().any(|m| m.name() == name) {
            return Err(Error::DuplicateMember(name.to_string()));
        }
        self.methods.push(MethodEmitter::new(name, params));
        Ok(self
            .methods
            .last_mut()
            .ok_or_else(|| Error::Error("method emitter vanished".to_string()))?)
    }

    /// Declares a constructor with the given parameter types and returns its emitter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMember`] if a constructor with the same signature was already
    /// declared.
    pub fn create_constructor(&mut self, params: Vec<ParamKind>) -> Result<&mut ConstructorEmitter> {
        if self.constructors.iter().any(|c| c.params() == params) {
            return Err(Error::DuplicateMember(".ctor".to_string()));
        }
        self.constructors.push(ConstructorEmitter::new(params));
        Ok(self
            .constructors
            .last_mut()
            .ok_or_else(|| Error::Error("constructor emitter vanished".to_string()))?)
    }

    /// Applies a custom attribute to the synthesized type.
    pub fn define_attribute(&mut self, attribute: AttributeDesc) {
        self.attributes.push(attribute);
    }

    /// Freezes the type under construction into an immutable [`SynthesizedType`].
    #[must_use]
    pub fn build(self) -> SynthesizedType {
        SynthesizedType {
            name: self.name,
            target: self.target,
            fields: self.fields,
            methods: self.methods.into_iter().map(EmittedMethod::from).collect(),
            constructors: self
                .constructors
                .into_iter()
                .map(EmittedConstructor::from)
                .collect(),
            attributes: self.attributes,
        }
    }
}

/// A finalized method of a synthesized type.
#[derive(Debug)]
pub struct EmittedMethod {
    name: String,
    params: Vec<ParamKind>,
    locals: Vec<ValueKind>,
    statements: Vec<Statement>,
}

impl EmittedMethod {
    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter signature.
    #[must_use]
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    /// Declared locals, by slot index.
    #[must_use]
    pub fn locals(&self) -> &[ValueKind] {
        &self.locals
    }

    /// Body statements, in execution order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}

impl From<MethodEmitter> for EmittedMethod {
    fn from(emitter: MethodEmitter) -> Self {
        let (name, params, code) = emitter.into_parts();
        let (locals, statements) = code.into_parts();
        EmittedMethod {
            name,
            params,
            locals,
            statements,
        }
    }
}

/// A finalized constructor of a synthesized type.
#[derive(Debug)]
pub struct EmittedConstructor {
    params: Vec<ParamKind>,
    locals: Vec<ValueKind>,
    statements: Vec<Statement>,
}

impl EmittedConstructor {
    /// Parameter signature.
    #[must_use]
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    /// Declared locals, by slot index.
    #[must_use]
    pub fn locals(&self) -> &[ValueKind] {
        &self.locals
    }

    /// Body statements, in execution order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}

impl From<ConstructorEmitter> for EmittedConstructor {
    fn from(emitter: ConstructorEmitter) -> Self {
        let (params, code) = emitter.into_parts();
        let (locals, statements) = code.into_parts();
        EmittedConstructor {
            params,
            locals,
            statements,
        }
    }
}

/// An immutable, fully assembled synthesized subtype.
#[derive(Debug)]
pub struct SynthesizedType {
    name: String,
    target: Arc<TargetType>,
    fields: Vec<FieldHandle>,
    methods: Vec<EmittedMethod>,
    constructors: Vec<EmittedConstructor>,
    attributes: Vec<AttributeDesc>,
}

impl SynthesizedType {
    /// Name of the synthesized type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type this subtype proxies.
    #[must_use]
    pub fn target(&self) -> &Arc<TargetType> {
        &self.target
    }

    /// Fields declared on the synthesized type itself.
    #[must_use]
    pub fn fields(&self) -> &[FieldHandle] {
        &self.fields
    }

    /// Attributes replicated onto the synthesized type.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeDesc] {
        &self.attributes
    }

    /// All emitted methods.
    #[must_use]
    pub fn methods(&self) -> &[EmittedMethod] {
        &self.methods
    }

    /// Looks up an emitted method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&EmittedMethod> {
        self.methods.iter().find(|m| m.name() == name)
    }

    /// Returns the emitted two-argument reconstruction constructor, if one was generated.
    #[must_use]
    pub fn reconstruction_constructor(&self) -> Option<&EmittedConstructor> {
        self.constructors
            .iter()
            .find(|c| c.params() == [ParamKind::Info, ParamKind::Context])
    }

    /// Seeds a fresh field map with the target's defaults plus the synthesized type's own
    /// fields at their zero values.
    #[must_use]
    pub fn default_fields(&self) -> crate::metadata::FieldMap {
        let mut map = self.target.default_fields();
        for field in &self.fields {
            map.set(field.name(), Value::default_of(field.kind()));
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TargetTypeBuilder;

    fn sample_target() -> Arc<TargetType> {
        TargetTypeBuilder::new("MyApp.Point")
            .field("X", ValueKind::Int32)
            .build()
            .expect("valid target")
    }

    #[test]
    fn test_shell_declares_interceptors_field() {
        let class = ClassEmitter::new("PointProxy", sample_target());
        let field = class.get_field(INTERCEPTORS_FIELD).expect("shell field");
        assert_eq!(field.kind(), ValueKind::Array);
    }

    #[test]
    fn test_create_field_rejects_duplicates() -> Result<()> {
        let mut class = ClassEmitter::new("PointProxy", sample_target());
        class.create_field("__selector", ValueKind::Object)?;

        assert!(matches!(
            class.create_field("__selector", ValueKind::Object),
            Err(Error::DuplicateMember(_))
        ));
        // shadowing a base field is rejected as well
        assert!(matches!(
            class.create_field("X", ValueKind::Int32),
            Err(Error::DuplicateMember(_))
        ));
        Ok(())
    }

    #[test]
    fn test_create_method_rejects_duplicates() -> Result<()> {
        let mut class = ClassEmitter::new("PointProxy", sample_target());
        class.create_method("ToString", Vec::new())?;
        assert!(matches!(
            class.create_method("ToString", Vec::new()),
            Err(Error::DuplicateMember(_))
        ));
        Ok(())
    }

    #[test]
    fn test_build_freezes_members() -> Result<()> {
        let mut class = ClassEmitter::new("PointProxy", sample_target());
        {
            let method = class.create_method("ToString", Vec::new())?;
            method
                .code_builder()
                .add_statement(Statement::Return(None));
        }
        class.create_constructor(vec![ParamKind::Info, ParamKind::Context])?;

        let built = class.build();
        assert_eq!(built.name(), "PointProxy");
        assert!(built.method("ToString").is_some());
        assert!(built.reconstruction_constructor().is_some());
        assert!(built.default_fields().contains(INTERCEPTORS_FIELD));
        assert!(built.default_fields().contains("X"));
        Ok(())
    }
}
