//! # fhirops-core
//!
//! Value types shared by the fhirops operation engine: the generic
//! `Parameters` container operations are invoked with, and the relative
//! `Reference` used for instance-level targets.
//!
//! This crate has no opinion on dispatch; see `fhirops-engine` for the
//! registry and binding machinery.

pub mod error;
pub mod parameters;
pub mod reference;

pub use error::{CoreError, ErrorCategory, Result};
pub use parameters::{ParameterEntry, Parameters};
pub use reference::Reference;
