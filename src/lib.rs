// Copyright 2026 The proxyforge contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]

//! # proxyforge
//!
//! A contributor-based type-synthesis framework for building dynamic proxy subtypes that
//! transparently preserve their target type's serialization behavior.
//!
//! `proxyforge` models the instance-level half of a proxy-construction pipeline: given a
//! description of an existing type, independently authored *contributors* incrementally
//! augment a synthesized subtype so that its instances participate in the host serialization
//! protocol exactly as the original would, and additionally expose the interceptor set behind
//! the proxy without altering the original type's public contract.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use proxyforge::prelude::*;
//!
//! // Describe the type being proxied: serializable, implementing the protocol itself.
//! let target = TargetTypeBuilder::new("Bank.Account")
//!     .serializable()
//!     .field("Balance", ValueKind::Float64)
//!     .serializable_protocol(
//!         MethodModifiers::VIRTUAL,
//!         Arc::new(|fields, info, _| info.add_value("Balance", fields.get("Balance")?.clone())),
//!     )
//!     .reconstruction_constructor(Arc::new(|fields, info, _| {
//!         fields.set("Balance", info.get_value("Balance", ValueKind::Float64)?);
//!         Ok(())
//!     }))
//!     .build()?;
//!
//! // Analysis phase: the contributor fixes its strategy and claims the entry point.
//! let options = ProxyGenerationOptions::default();
//! let mut skip = MethodsToSkip::default();
//! let contributor = ClassInstanceContributor::new(target.clone(), &mut skip, &options)?;
//! assert!(contributor.delegates_to_base());
//!
//! // Generation phase: contributors mutate the type under construction in fixed order.
//! let mut class = ClassEmitter::new("AccountProxy", target);
//! let mut pipeline = ContributorPipeline::new();
//! pipeline.register(contributor);
//! pipeline.run(&mut class, &options)?;
//!
//! // Materialize, serialize, reconstruct.
//! let ty = Arc::new(class.build());
//! let mut instance = ProxyInstance::new(ty.clone(), vec![]);
//! instance.set_field("Balance", Value::Float64(42.5))?;
//!
//! let mut payload = SerializationInfo::new();
//! serialize(&instance, &mut payload, StreamingContext::default())?;
//! let restored = reconstruct(&ty, &payload, StreamingContext::default())?;
//! assert_eq!(restored.field("Balance")?, &Value::Float64(42.5));
//! # Ok::<(), proxyforge::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `proxyforge` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`metadata`] - Read-only member reference model of the target type
//! - [`serialization`] - The host serialization protocol boundary and reserved payload keys
//! - [`emit`] - The code assembly abstraction: instruction algebra, emitters, frozen types
//! - [`contributors`] - The contributor role, the two-phase pipeline, and the class instance
//!   contributor with its strategy analysis
//! - [`runtime`] - An interpreting backend that instantiates synthesized types and drives the
//!   serialization round trip
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ## Serialization strategies
//!
//! The class instance contributor decides between two strategies when it is constructed:
//! *delegate-to-base* when the target implements the serialization protocol itself (its entry
//! point must be overridable and a paired reconstruction constructor must exist - anything
//! else is a fatal configuration error), and *reflect-and-replay* when the target is merely
//! marked serializable. The chosen strategy is recorded in every payload under a reserved key
//! so reconstruction never has to re-derive it from the type system.

pub mod contributors;
pub mod emit;
mod error;
pub mod metadata;
pub mod prelude;
pub mod runtime;
pub mod serialization;

/// The result type used throughout proxyforge.
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;
