use thiserror::Error;

use crate::metadata::ValueKind;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Failures fall into two categories with very different weight:
///
/// ## Configuration errors
/// - [`Error::NonOverridableEntryPoint`] - Target type's serialization entry point cannot be overridden
/// - [`Error::MissingReconstructionPath`] - Target type provides no deserialization constructor
///
/// Both are raised during contributor analysis, before any member is emitted. They describe an
/// unsupported shape of the target type; the caller must exclude or redesign that type. There is
/// no partial generation - either the contributor fully succeeds or the synthesis attempt aborts.
///
/// ## Model and emission errors
/// - [`Error::MemberNotFound`] / [`Error::DuplicateMember`] - Invalid member lookups or declarations
/// - [`Error::KindMismatch`] - A value did not match the kind required at its position
/// - [`Error::DuplicatePayloadEntry`] / [`Error::PayloadEntryMissing`] - Serialization payload misuse
/// - [`Error::SnapshotMismatch`] - Snapshot replay with a mismatched member count
/// - [`Error::InvalidCodeReference`] - Emitted code referenced a slot that does not exist
///
/// # Examples
///
/// ```rust
/// use proxyforge::{Error, metadata::TargetTypeBuilder, contributors::{ClassInstanceContributor, MethodsToSkip, ProxyGenerationOptions}};
///
/// let target = TargetTypeBuilder::new("Sealed.Account").build()?;
/// let mut skip = MethodsToSkip::default();
/// match ClassInstanceContributor::new(target, &mut skip, &ProxyGenerationOptions::default()) {
///     Ok(_) => println!("target is compatible"),
///     Err(Error::NonOverridableEntryPoint(name)) => eprintln!("{name} cannot be proxied"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// # Ok::<(), proxyforge::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The target type implements the serialization protocol, but its entry point cannot be
    /// overridden.
    ///
    /// Raised during contributor analysis when `GetObjectData` is private, non-virtual or final.
    /// Proxy synthesis needs the entry point to be overridable to preserve the serialization
    /// process of the synthesized subtype.
    #[error("The type {0} implements ISerializable, but GetObjectData is not overridable. \
             Proxy synthesis needs types implementing ISerializable to keep GetObjectData \
             virtual and implicitly implemented to ensure a correct serialization process.")]
    NonOverridableEntryPoint(String),

    /// The target type implements the serialization protocol but exposes no two-argument
    /// reconstruction constructor.
    ///
    /// Raised during contributor analysis. A type that writes its own payload must also provide
    /// the paired (serialization-info, streaming-context) constructor to read it back.
    #[error("The type {0} implements ISerializable, but failed to provide a deserialization constructor")]
    MissingReconstructionPath(String),

    /// A member lookup by name failed on a target or synthesized type.
    #[error("Member not found - {0}")]
    MemberNotFound(String),

    /// A member with the same name was declared twice.
    ///
    /// Returned by the target type builder and by the class emitter when a field, method or
    /// constructor would shadow an already declared one.
    #[error("Duplicate member - {0}")]
    DuplicateMember(String),

    /// A value did not match the kind required at its position.
    ///
    /// Produced by typed payload reads and by emitted conversion expressions.
    #[error("Expected a value of kind {expected}, found {found}")]
    KindMismatch {
        /// The kind required at this position
        expected: ValueKind,
        /// The kind of the value actually present
        found: ValueKind,
    },

    /// A serialization payload entry was written twice under the same name.
    #[error("Payload entry already present - {0}")]
    DuplicatePayloadEntry(String),

    /// A serialization payload entry requested during reconstruction is missing.
    #[error("Payload entry not found - {0}")]
    PayloadEntryMissing(String),

    /// A member snapshot was replayed against a mismatched member list.
    #[error("Snapshot holds {found} values but {expected} members were enumerated")]
    SnapshotMismatch {
        /// Number of members enumerated on the target type
        expected: usize,
        /// Number of values present in the snapshot
        found: usize,
    },

    /// Emitted code referenced an argument, local or receiver that does not exist.
    ///
    /// This indicates a defect in the code that assembled the method body, not in the caller's
    /// input.
    #[error("Invalid code reference - {0}")]
    InvalidCodeReference(String),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
