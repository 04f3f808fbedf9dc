//! # Contributors Module
//!
//! Units of incremental augmentation applied to a type under construction.
//!
//! A [`Contributor`] decides during its own construction whether and how it applies to the
//! target type, then emits members and statements when the pipeline invokes
//! [`generate`](Contributor::generate). The split is load-bearing: analysis may claim members
//! in the shared [`MethodsToSkip`] set, and every contributor's analysis must complete before
//! any generation runs so downstream interception wiring reads a settled set.
//! [`ContributorPipeline`] makes that two-phase protocol structural - contributors are
//! registered fully constructed, and running the pipeline consumes it.

mod class_instance;

use std::collections::HashSet;

use crate::emit::ClassEmitter;
use crate::metadata::MethodDesc;
use crate::Result;

pub use class_instance::ClassInstanceContributor;

/// Options governing one type-synthesis run.
#[derive(Debug, Clone)]
pub struct ProxyGenerationOptions {
    /// Whether the host profile supports the serialization protocol at all.
    ///
    /// Resolved once at startup; when false, serialization support is skipped for every target
    /// regardless of its shape, the way a restricted runtime profile would disable it.
    pub serialization_support: bool,
}

impl Default for ProxyGenerationOptions {
    fn default() -> Self {
        ProxyGenerationOptions {
            serialization_support: true,
        }
    }
}

/// Methods that downstream interception wiring must not intercept.
///
/// Contributors insert during their analysis phase when they take ownership of a member's
/// emission; the set is read-only once generation begins.
#[derive(Debug, Clone, Default)]
pub struct MethodsToSkip {
    names: HashSet<String>,
}

impl MethodsToSkip {
    /// Claims a method, excluding it from interception.
    pub fn insert(&mut self, method: &MethodDesc) {
        self.names.insert(method.name.clone());
    }

    /// Returns true if the given method was claimed.
    #[must_use]
    pub fn contains(&self, method: &MethodDesc) -> bool {
        self.names.contains(&method.name)
    }

    /// Returns true if a method with the given name was claimed.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of claimed methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no method was claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A unit of incremental augmentation applied to the type under construction.
pub trait Contributor {
    /// Emits this contributor's members and statements into the type under construction.
    ///
    /// Applicability was already decided when the contributor was constructed; `generate`
    /// only acts on that decision.
    ///
    /// # Errors
    ///
    /// Fails only on emitter misuse; applicability errors surface at construction time.
    fn generate(&mut self, class: &mut ClassEmitter, options: &ProxyGenerationOptions)
        -> Result<()>;
}

/// Fixed-order driver for the generation phase.
///
/// Contributors are registered fully constructed - their analysis already ran - and
/// [`run`](ContributorPipeline::run) consumes the pipeline, so no further analysis can
/// interleave with generation.
#[derive(Default)]
pub struct ContributorPipeline {
    contributors: Vec<Box<dyn Contributor>>,
}

impl ContributorPipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        ContributorPipeline::default()
    }

    /// Appends a contributor; generation runs in registration order.
    pub fn register<C: Contributor + 'static>(&mut self, contributor: C) {
        self.contributors.push(Box::new(contributor));
    }

    /// Invokes every contributor's `generate` in registration order.
    ///
    /// # Errors
    ///
    /// Propagates the first contributor failure; the type under construction must be
    /// considered poisoned afterwards.
    pub fn run(mut self, class: &mut ClassEmitter, options: &ProxyGenerationOptions) -> Result<()> {
        for contributor in &mut self.contributors {
            contributor.generate(class, options)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{TargetTypeBuilder, ValueKind};

    struct FieldContributor(&'static str);

    impl Contributor for FieldContributor {
        fn generate(
            &mut self,
            class: &mut ClassEmitter,
            _options: &ProxyGenerationOptions,
        ) -> Result<()> {
            class.create_field(self.0, ValueKind::Object)?;
            Ok(())
        }
    }

    #[test]
    fn test_pipeline_runs_in_registration_order() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Plain").build()?;
        let mut class = ClassEmitter::new("PlainProxy", target);

        let mut pipeline = ContributorPipeline::new();
        pipeline.register(FieldContributor("__first"));
        pipeline.register(FieldContributor("__second"));
        pipeline.run(&mut class, &ProxyGenerationOptions::default())?;

        let names: Vec<&str> = class.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["__interceptors", "__first", "__second"]);
        Ok(())
    }

    #[test]
    fn test_pipeline_stops_on_failure() -> Result<()> {
        let target = TargetTypeBuilder::new("MyApp.Plain").build()?;
        let mut class = ClassEmitter::new("PlainProxy", target);

        let mut pipeline = ContributorPipeline::new();
        pipeline.register(FieldContributor("__dup"));
        pipeline.register(FieldContributor("__dup"));
        assert!(pipeline
            .run(&mut class, &ProxyGenerationOptions::default())
            .is_err());
        Ok(())
    }

    #[test]
    fn test_methods_to_skip_identity() -> Result<()> {
        use crate::metadata::{MethodModifiers, GET_OBJECT_DATA};

        let target = TargetTypeBuilder::new("MyApp.Plain")
            .method(GET_OBJECT_DATA, MethodModifiers::VIRTUAL, Vec::new())
            .build()?;
        let entry = target.method(GET_OBJECT_DATA).expect("declared above");

        let mut skip = MethodsToSkip::default();
        assert!(skip.is_empty());
        skip.insert(entry);
        assert!(skip.contains(entry));
        assert!(skip.contains_name(GET_OBJECT_DATA));
        assert_eq!(skip.len(), 1);
        Ok(())
    }
}
