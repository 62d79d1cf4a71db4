//! # fhirops-engine
//!
//! Named-operation dispatch and parameter binding for FHIR-style operations.
//!
//! Handler modules declare their operations with an explicit builder, a
//! registry collects them during a startup phase, and callers dispatch
//! through an [`InvocationRequest`]. The engine resolves the unique handler
//! for a name, scope and resource type, binds the generic parameter
//! container onto the handler's declared parameters, and enforces that every
//! supplied parameter was claimed.
//!
//! # Architecture
//!
//! - **ParameterBinder**: strategy for resolving one argument — the
//!   out-of-band identity, a named entry, or the remaining container
//! - **OperationDescriptor**: per-operation metadata, built once and
//!   immutable; the scope is derived from the declared parameters
//! - **OperationClosure**: a descriptor paired with a factory producing a
//!   fresh handler per call from the request context
//! - **OperationRegistry**: write-once table built by [`RegistryBuilder`],
//!   read concurrently during the serve phase
//! - **InvocationRequest**: the per-call bundle of context, name, target,
//!   and parameters
//!
//! # Example
//!
//! ```
//! use fhirops_core::Parameters;
//! use fhirops_engine::{
//!     InvocationRequest, OperationClosure, OperationDescriptor, OperationHandler,
//!     RegistryBuilder,
//! };
//! use serde_json::{Value, json};
//!
//! struct Summarize;
//!
//! impl OperationHandler for Summarize {
//!     fn invoke(&mut self, mut args: Vec<Value>) -> anyhow::Result<Value> {
//!         Ok(json!({ "count": args.remove(0) }))
//!     }
//! }
//!
//! let descriptor = OperationDescriptor::builder("$summarize")
//!     .resource_type("Patient")
//!     .param("count")
//!     .build()
//!     .unwrap();
//!
//! let mut builder = RegistryBuilder::new();
//! builder.register_closure(OperationClosure::new(descriptor, |_repo: &()| {
//!     Box::new(Summarize) as Box<dyn OperationHandler>
//! }));
//! let registry = builder.build().unwrap();
//!
//! let params = Parameters::from_pairs([("count", json!(5))]);
//! let result = registry
//!     .execute(
//!         InvocationRequest::new(&(), "summarize")
//!             .on_type("Patient")
//!             .with_parameters(&params),
//!     )
//!     .unwrap();
//! assert_eq!(result, json!({ "count": 5 }));
//! ```

pub mod binder;
pub mod descriptor;
pub mod error;
pub mod provider;
pub mod registry;
pub mod request;

pub use binder::{NamedBinder, ParameterBinder};
pub use descriptor::{DescriptorBuilder, OperationDescriptor, OperationScope};
pub use error::{ErrorKind, OperationError, Result};
pub use provider::{HandlerFactory, OperationClosure, OperationHandler, OperationProvider};
pub use registry::{OperationRegistry, RegistryBuilder};
pub use request::InvocationRequest;
