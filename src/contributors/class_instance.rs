//! Instance-level augmentation for class proxies: capability access, attribute replication,
//! and conditional serialization round-trip support.
//!
//! The serialization strategy is decided once, at construction time, from the target type's
//! shape:
//!
//! - **Delegate-to-base**: the target implements the serialization protocol itself with an
//!   overridable entry point and a paired reconstruction constructor. The emitted override
//!   calls straight into the target's entry point, and a matching (serialization-info,
//!   streaming-context) constructor is emitted that replays base state and the proxy's own
//!   recorded fields.
//! - **Reflect-and-replay**: the target is merely marked serializable. The emitted override
//!   snapshots all serializable members generically under a reserved key; reconstruction
//!   replays the snapshot without any dedicated constructor.
//!
//! Incompatible target shapes (non-overridable entry point, missing reconstruction
//! constructor) fail at construction time, before anything is emitted.

use std::sync::Arc;

use crate::contributors::{Contributor, MethodsToSkip, ProxyGenerationOptions};
use crate::emit::{
    AssignTarget, Callee, ClassEmitter, CodeBuilder, Expression, FieldHandle, Statement,
    DYN_PROXY_GET_TARGET, GET_INTERCEPTORS, INTERCEPTORS_FIELD,
};
use crate::metadata::{
    non_inheritable_attributes, ConstructorDesc, ParamKind, TargetType, Value, ValueKind,
    GET_OBJECT_DATA, SERIALIZABLE_INTERFACE,
};
use crate::serialization::{DATA_KEY, DELEGATE_KEY};
use crate::{Error, Result};

/// Contributes instance-level members to a synthesized class proxy.
///
/// Capability-access members and replicated attributes are emitted unconditionally; the
/// serialization round trip is emitted only when the target type opts into serialization, with
/// the strategy fixed during construction.
///
/// # Examples
///
/// ```rust
/// use proxyforge::contributors::{ClassInstanceContributor, ContributorPipeline, MethodsToSkip, ProxyGenerationOptions};
/// use proxyforge::emit::ClassEmitter;
/// use proxyforge::metadata::TargetTypeBuilder;
///
/// let target = TargetTypeBuilder::new("MyApp.Plain").build()?;
/// let options = ProxyGenerationOptions::default();
///
/// // analysis phase: every contributor is constructed first
/// let mut skip = MethodsToSkip::default();
/// let contributor = ClassInstanceContributor::new(target.clone(), &mut skip, &options)?;
///
/// // generation phase: the pipeline mutates the type under construction in fixed order
/// let mut class = ClassEmitter::new("PlainProxy", target);
/// let mut pipeline = ContributorPipeline::new();
/// pipeline.register(contributor);
/// pipeline.run(&mut class, &options)?;
///
/// let ty = class.build();
/// assert!(ty.method("GetInterceptors").is_some());
/// # Ok::<(), proxyforge::Error>(())
/// ```
pub struct ClassInstanceContributor {
    target: Arc<TargetType>,
    implements_serialization: bool,
    delegate_to_base: bool,
    reconstruction_constructor: Option<Arc<ConstructorDesc>>,
    serialized_fields: Vec<FieldHandle>,
}

impl ClassInstanceContributor {
    /// Analyzes the target type and fixes the serialization strategy.
    ///
    /// When the target implements the serialization protocol itself, its entry point is
    /// claimed in `methods_to_skip` so interception wiring leaves it alone - this contributor
    /// fully owns emitting the override.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonOverridableEntryPoint`] if the target implements the protocol but
    /// its entry point is private, non-virtual or final, and
    /// [`Error::MissingReconstructionPath`] if it provides no two-argument reconstruction
    /// constructor. Both abort synthesis before any member is emitted.
    pub fn new(
        target: Arc<TargetType>,
        methods_to_skip: &mut MethodsToSkip,
        options: &ProxyGenerationOptions,
    ) -> Result<Self> {
        let mut contributor = ClassInstanceContributor {
            target,
            implements_serialization: false,
            delegate_to_base: false,
            reconstruction_constructor: None,
            serialized_fields: Vec::new(),
        };

        if options.serialization_support && contributor.target.is_serializable() {
            contributor.implements_serialization = true;
            contributor.delegate_to_base = contributor.verify_entry_point(methods_to_skip)?;
        }

        Ok(contributor)
    }

    /// True if the target opts into serialization and support will be emitted.
    #[must_use]
    pub fn implements_serialization(&self) -> bool {
        self.implements_serialization
    }

    /// True if the delegate-to-base strategy was chosen.
    #[must_use]
    pub fn delegates_to_base(&self) -> bool {
        self.delegate_to_base
    }

    /// Decides between the two strategies, claiming the entry point when delegating.
    fn verify_entry_point(&mut self, methods_to_skip: &mut MethodsToSkip) -> Result<bool> {
        if !self.target.implements(SERIALIZABLE_INTERFACE) {
            return Ok(false);
        }

        let entry = self
            .target
            .method(GET_OBJECT_DATA)
            .filter(|m| m.modifiers.is_overridable())
            .ok_or_else(|| Error::NonOverridableEntryPoint(self.target.name().to_string()))?;
        methods_to_skip.insert(entry);

        let ctor = self
            .target
            .serialization_constructor()
            .ok_or_else(|| Error::MissingReconstructionPath(self.target.name().to_string()))?;
        self.reconstruction_constructor = Some(ctor.clone());
        Ok(true)
    }

    /// Writes one proxy field into the payload and records it for the reconstruction path.
    ///
    /// Every write funneled through here is replayed by name, in this order, when the
    /// delegate-path constructor runs.
    fn add_value(&mut self, code: &mut CodeBuilder, field: &FieldHandle) {
        self.serialized_fields.push(field.clone());
        code.add_statement(Statement::Eval(Expression::Invoke {
            callee: Callee::InfoAddValue,
            receiver: Some(Box::new(Expression::Arg(0))),
            args: vec![
                Expression::name(field.name()),
                Expression::Field(field.clone()),
            ],
        }));
    }

    fn implement_get_object_data(&mut self, class: &mut ClassEmitter) -> Result<()> {
        let proxy_fields: Vec<FieldHandle> = class.fields().to_vec();
        let base_entry = if self.delegate_to_base {
            Some(
                self.target
                    .method(GET_OBJECT_DATA)
                    .cloned()
                    .ok_or_else(|| Error::MemberNotFound(GET_OBJECT_DATA.to_string()))?,
            )
        } else {
            None
        };
        let target = self.target.clone();

        let method =
            class.create_method(GET_OBJECT_DATA, vec![ParamKind::Info, ParamKind::Context])?;
        let code = method.code_builder();

        for field in &proxy_fields {
            self.add_value(code, field);
        }

        // the flag the reconstruction path dispatches on
        code.add_statement(Statement::Eval(Expression::Invoke {
            callee: Callee::InfoAddValue,
            receiver: Some(Box::new(Expression::Arg(0))),
            args: vec![
                Expression::name(DELEGATE_KEY),
                Expression::Literal(Value::Bool(self.delegate_to_base)),
            ],
        }));

        if let Some(entry) = base_entry {
            // non-virtual call into the target's own entry point
            code.add_statement(Statement::Eval(Expression::Invoke {
                callee: Callee::BaseMethod(entry),
                receiver: Some(Box::new(Expression::This)),
                args: vec![Expression::Arg(0), Expression::Arg(1)],
            }));
        } else {
            let members = code.declare_local(ValueKind::Object);
            let data = code.declare_local(ValueKind::Array);

            code.add_statement(Statement::Assign {
                target: AssignTarget::Local(members),
                value: Expression::Invoke {
                    callee: Callee::MembersOf,
                    receiver: None,
                    args: vec![Expression::TypeToken(target)],
                },
            });
            code.add_statement(Statement::Assign {
                target: AssignTarget::Local(data),
                value: Expression::Invoke {
                    callee: Callee::Snapshot,
                    receiver: None,
                    args: vec![Expression::This, Expression::Local(members)],
                },
            });
            code.add_statement(Statement::Eval(Expression::Invoke {
                callee: Callee::InfoAddValue,
                receiver: Some(Box::new(Expression::Arg(0))),
                args: vec![Expression::name(DATA_KEY), Expression::Local(data)],
            }));
        }

        code.add_statement(Statement::Return(None));
        Ok(())
    }

    /// Emits the (serialization-info, streaming-context) constructor of the delegate path.
    fn generate_serialization_constructor(&self, class: &mut ClassEmitter) -> Result<()> {
        let base_ctor = self
            .reconstruction_constructor
            .clone()
            .ok_or_else(|| Error::MissingReconstructionPath(self.target.name().to_string()))?;

        let ctor = class.create_constructor(vec![ParamKind::Info, ParamKind::Context])?;
        let code = ctor.code_builder();

        code.add_statement(Statement::InvokeBaseConstructor {
            ctor: base_ctor,
            args: vec![Expression::Arg(0), Expression::Arg(1)],
        });

        // replay recorded writes in their exact emission order, typed by declared kind
        for field in &self.serialized_fields {
            let read = Expression::Invoke {
                callee: Callee::InfoGetValue,
                receiver: Some(Box::new(Expression::Arg(0))),
                args: vec![
                    Expression::name(field.name()),
                    Expression::KindToken(field.kind()),
                ],
            };
            code.add_statement(Statement::Assign {
                target: AssignTarget::Field(field.clone()),
                value: Expression::Convert {
                    to: field.kind(),
                    expr: Box::new(read),
                },
            });
        }

        code.add_statement(Statement::Return(None));
        Ok(())
    }

    /// Emits the capability-access members exposing the interceptor set and the real target.
    fn implement_target_accessor(&self, class: &mut ClassEmitter) -> Result<()> {
        let interceptors = class
            .get_field(INTERCEPTORS_FIELD)
            .ok_or_else(|| Error::MemberNotFound(INTERCEPTORS_FIELD.to_string()))?;

        let method = class.create_method(GET_INTERCEPTORS, Vec::new())?;
        method
            .code_builder()
            .add_statement(Statement::Return(Some(Expression::Field(interceptors))));

        // a class proxy is its own target
        let method = class.create_method(DYN_PROXY_GET_TARGET, Vec::new())?;
        method
            .code_builder()
            .add_statement(Statement::Return(Some(Expression::This)));
        Ok(())
    }
}

impl Contributor for ClassInstanceContributor {
    fn generate(
        &mut self,
        class: &mut ClassEmitter,
        _options: &ProxyGenerationOptions,
    ) -> Result<()> {
        if self.implements_serialization {
            self.implement_get_object_data(class)?;
            if self.delegate_to_base {
                self.generate_serialization_constructor(class)?;
            }
        }

        self.implement_target_accessor(class)?;
        for attribute in non_inheritable_attributes(&self.target) {
            class.define_attribute(attribute);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MethodModifiers, TargetTypeBuilder};

    fn protocol_target(modifiers: MethodModifiers, with_ctor: bool) -> Arc<TargetType> {
        let builder = TargetTypeBuilder::new("MyApp.Account")
            .serializable()
            .field("Balance", ValueKind::Float64)
            .serializable_protocol(
                modifiers,
                Arc::new(|fields, info, _| {
                    info.add_value("Balance", fields.get("Balance")?.clone())
                }),
            );
        let builder = if with_ctor {
            builder.reconstruction_constructor(Arc::new(|fields, info, _| {
                fields.set("Balance", info.get_value("Balance", ValueKind::Float64)?);
                Ok(())
            }))
        } else {
            builder
        };
        builder.build().expect("valid target")
    }

    #[test]
    fn test_non_serializable_target_is_inert() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Plain").build()?;
        let mut skip = MethodsToSkip::default();
        let contributor = ClassInstanceContributor::new(
            target,
            &mut skip,
            &ProxyGenerationOptions::default(),
        )?;

        assert!(!contributor.implements_serialization());
        assert!(!contributor.delegates_to_base());
        assert!(skip.is_empty());
        Ok(())
    }

    #[test]
    fn test_marked_only_target_uses_reflect_strategy() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Point")
            .serializable()
            .field("X", ValueKind::Int32)
            .build()?;
        let mut skip = MethodsToSkip::default();
        let contributor = ClassInstanceContributor::new(
            target,
            &mut skip,
            &ProxyGenerationOptions::default(),
        )?;

        assert!(contributor.implements_serialization());
        assert!(!contributor.delegates_to_base());
        assert!(skip.is_empty());
        Ok(())
    }

    #[test]
    fn test_protocol_target_uses_delegate_strategy_and_claims_entry_point() -> Result<()> {
        let target = protocol_target(MethodModifiers::VIRTUAL, true);
        let mut skip = MethodsToSkip::default();
        let contributor = ClassInstanceContributor::new(
            target,
            &mut skip,
            &ProxyGenerationOptions::default(),
        )?;

        assert!(contributor.delegates_to_base());
        assert!(skip.contains_name(GET_OBJECT_DATA));
        assert_eq!(skip.len(), 1);
        Ok(())
    }

    #[test]
    fn test_non_virtual_entry_point_fails_fast() {
        for modifiers in [
            MethodModifiers::empty(),
            MethodModifiers::VIRTUAL | MethodModifiers::FINAL,
            MethodModifiers::VIRTUAL | MethodModifiers::PRIVATE,
        ] {
            let target = protocol_target(modifiers, true);
            let mut skip = MethodsToSkip::default();
            let result = ClassInstanceContributor::new(
                target,
                &mut skip,
                &ProxyGenerationOptions::default(),
            );
            assert!(matches!(
                result,
                Err(Error::NonOverridableEntryPoint(name)) if name == "MyApp.Account"
            ));
            assert!(skip.is_empty());
        }
    }

    #[test]
    fn test_missing_reconstruction_constructor_fails_fast() {
        let target = protocol_target(MethodModifiers::VIRTUAL, false);
        let mut skip = MethodsToSkip::default();
        let result = ClassInstanceContributor::new(
            target,
            &mut skip,
            &ProxyGenerationOptions::default(),
        );
        assert!(matches!(
            result,
            Err(Error::MissingReconstructionPath(name)) if name == "MyApp.Account"
        ));
    }

    #[test]
    fn test_profile_without_serialization_support() -> Result<()> {
        let target = protocol_target(MethodModifiers::VIRTUAL, true);
        let mut skip = MethodsToSkip::default();
        let options = ProxyGenerationOptions {
            serialization_support: false,
        };
        let mut contributor = ClassInstanceContributor::new(target.clone(), &mut skip, &options)?;

        assert!(!contributor.implements_serialization());
        assert!(skip.is_empty());

        let mut class = ClassEmitter::new("AccountProxy", target);
        contributor.generate(&mut class, &options)?;
        let ty = class.build();

        // capability members still present, serialization members absent
        assert!(ty.method(GET_INTERCEPTORS).is_some());
        assert!(ty.method(GET_OBJECT_DATA).is_none());
        assert!(ty.reconstruction_constructor().is_none());
        Ok(())
    }

    #[test]
    fn test_generation_emits_capability_and_attributes_unconditionally() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Plain")
            .attribute("MyApp.AuditedAttribute", false)
            .attribute("MyApp.ObsoleteAttribute", true)
            .build()?;
        let mut skip = MethodsToSkip::default();
        let options = ProxyGenerationOptions::default();
        let mut contributor = ClassInstanceContributor::new(target.clone(), &mut skip, &options)?;

        let mut class = ClassEmitter::new("PlainProxy", target);
        contributor.generate(&mut class, &options)?;
        let ty = class.build();

        assert!(ty.method(GET_INTERCEPTORS).is_some());
        assert!(ty.method(DYN_PROXY_GET_TARGET).is_some());
        assert!(ty.method(GET_OBJECT_DATA).is_none());
        assert_eq!(ty.attributes().len(), 1);
        assert_eq!(ty.attributes()[0].type_name, "MyApp.AuditedAttribute");
        Ok(())
    }

    #[test]
    fn test_delegate_generation_emits_override_and_constructor() -> Result<()> {
        let target = protocol_target(MethodModifiers::VIRTUAL, true);
        let mut skip = MethodsToSkip::default();
        let options = ProxyGenerationOptions::default();
        let mut contributor = ClassInstanceContributor::new(target.clone(), &mut skip, &options)?;
        assert!(contributor.delegates_to_base());

        let mut class = ClassEmitter::new("AccountProxy", target);
        contributor.generate(&mut class, &options)?;
        let ty = class.build();

        assert!(ty.method(GET_OBJECT_DATA).is_some());
        assert!(ty.reconstruction_constructor().is_some());
        Ok(())
    }

    #[test]
    fn test_reflect_generation_emits_override_without_constructor() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Point")
            .serializable()
            .field("X", ValueKind::Int32)
            .build()?;
        let mut skip = MethodsToSkip::default();
        let options = ProxyGenerationOptions::default();
        let mut contributor = ClassInstanceContributor::new(target.clone(), &mut skip, &options)?;

        let mut class = ClassEmitter::new("PointProxy", target);
        contributor.generate(&mut class, &options)?;
        let ty = class.build();

        assert!(ty.method(GET_OBJECT_DATA).is_some());
        assert!(ty.reconstruction_constructor().is_none());
        Ok(())
    }
}
