//! Parameter binding strategies.
//!
//! Each declared handler parameter carries exactly one binder. At dispatch
//! time the binders run positionally against a private clone of the supplied
//! container: named binders consume their matching entries, the identity
//! binder resolves the out-of-band target, and a trailing capture binder
//! drains whatever is left.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use fhirops_core::Parameters;

use crate::error::{OperationError, Result};

/// Binding strategy for a single handler parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ParameterBinder {
    /// Binds the target identity supplied out-of-band; never reads the
    /// container. Always the first parameter when present.
    Identity,
    /// Binds (and consumes) the entries matching a declared name.
    Named(NamedBinder),
    /// Binds the entire remaining container; legal only as the last
    /// parameter, and opts the operation out of the consumption check.
    CaptureRest,
}

/// A named parameter slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedBinder {
    pub name: String,
    /// Absence of a required parameter is a binding error; an absent
    /// optional one binds as `null`.
    pub required: bool,
    /// Repeated parameters bind every matching entry as an array.
    pub repeated: bool,
}

impl NamedBinder {
    pub fn new(name: impl Into<String>, required: bool, repeated: bool) -> Self {
        Self {
            name: name.into(),
            required,
            repeated,
        }
    }

    /// Removes the matching entries from `params` and resolves the bound
    /// value according to the declared multiplicity.
    fn extract(&self, operation: &str, params: &mut Parameters) -> Result<Value> {
        let mut taken = params.take(&self.name);

        if self.repeated {
            if taken.is_empty() && self.required {
                return Err(OperationError::missing_parameter(operation, self.name.as_str()));
            }
            return Ok(Value::Array(taken));
        }

        match taken.len() {
            0 if self.required => Err(OperationError::missing_parameter(operation, self.name.as_str())),
            0 => Ok(Value::Null),
            1 => Ok(taken.remove(0)),
            _ => Err(OperationError::duplicate_parameter(operation, self.name.as_str())),
        }
    }
}

impl ParameterBinder {
    /// Single-valued required parameter.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(NamedBinder::new(name, true, false))
    }

    /// Single-valued optional parameter.
    pub fn optional(name: impl Into<String>) -> Self {
        Self::Named(NamedBinder::new(name, false, false))
    }

    /// Repeated parameter, bound as an array of matches.
    pub fn repeated(name: impl Into<String>) -> Self {
        Self::Named(NamedBinder::new(name, false, true))
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }

    pub fn is_capture(&self) -> bool {
        matches!(self, Self::CaptureRest)
    }

    /// The declared name for named binders.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(b) => Some(&b.name),
            _ => None,
        }
    }

    /// Resolves this binder's argument.
    ///
    /// Identity never comes from the container; the registry only routes
    /// instance-scoped requests here, so `identity` is present whenever an
    /// identity binder runs.
    pub(crate) fn bind(
        &self,
        operation: &str,
        identity: Option<&str>,
        params: &mut Parameters,
    ) -> Result<Value> {
        match self {
            Self::Identity => match identity {
                Some(id) => Ok(Value::String(id.to_string())),
                None => Err(OperationError::missing_parameter(operation, "identity")),
            },
            Self::Named(named) => named.extract(operation, params),
            Self::CaptureRest => {
                let rest = std::mem::take(params);
                Ok(rest.into_json())
            }
        }
    }
}
