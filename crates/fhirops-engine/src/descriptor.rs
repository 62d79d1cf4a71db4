//! Operation descriptors and the builder that validates them.
//!
//! A descriptor is the immutable metadata record for one registered
//! operation: its dispatch name, derived scope, target resource type, and
//! the ordered binders for the handler's parameters. Descriptors are built
//! once through [`DescriptorBuilder`] and shared freely afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::binder::ParameterBinder;
use crate::error::{OperationError, Result};

/// The resolution level an operation targets.
///
/// Derived, never declared: an identity binder makes the operation
/// instance-scoped; otherwise a declared resource type makes it type-scoped;
/// otherwise it is server-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationScope {
    Instance,
    Type,
    Server,
}

impl fmt::Display for OperationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance => write!(f, "instance"),
            Self::Type => write!(f, "type"),
            Self::Server => write!(f, "server"),
        }
    }
}

/// Immutable metadata for a registered operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDescriptor {
    name: String,
    scope: OperationScope,
    resource_type: Option<String>,
    binders: Vec<ParameterBinder>,
    canonical_url: Option<String>,
    description: Option<String>,
}

impl OperationDescriptor {
    /// Starts building a descriptor for the given operation name.
    ///
    /// A leading `$` sigil is stripped; dispatch keys never carry it.
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name)
    }

    /// The dispatch name, without the `$` sigil.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The derived resolution scope.
    pub fn scope(&self) -> OperationScope {
        self.scope
    }

    /// The resource type the operation applies to, if any.
    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    /// The parameter binders, in the handler's declaration order.
    pub fn binders(&self) -> &[ParameterBinder] {
        &self.binders
    }

    /// Canonical URL metadata; informational, not used for dispatch.
    pub fn canonical_url(&self) -> Option<&str> {
        self.canonical_url.as_deref()
    }

    /// Human-readable description; informational, not used for dispatch.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// True if the last binder is a capture-rest binder.
    pub fn captures_rest(&self) -> bool {
        self.binders.last().is_some_and(ParameterBinder::is_capture)
    }

    /// True if the descriptor applies to the given resource type.
    ///
    /// A descriptor without a declared type applies to every type, mirroring
    /// operations defined on the base `Resource`.
    pub fn applies_to(&self, resource_type: &str) -> bool {
        match &self.resource_type {
            Some(declared) => declared == resource_type,
            None => true,
        }
    }
}

/// Builder for [`OperationDescriptor`].
///
/// Parameters are declared in the handler's positional order; each call adds
/// exactly one binder, so a parameter can never carry zero or several
/// binding strategies. `build` validates ordering rules and derives the
/// scope.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    name: String,
    resource_type: Option<String>,
    binders: Vec<ParameterBinder>,
    canonical_url: Option<String>,
    description: Option<String>,
}

impl DescriptorBuilder {
    fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.strip_prefix('$').unwrap_or(&name).to_string();
        Self {
            name,
            resource_type: None,
            binders: Vec::new(),
            canonical_url: None,
            description: None,
        }
    }

    /// Declares the resource type the operation targets.
    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Declares the target-identity parameter (first positional argument).
    pub fn identity(mut self) -> Self {
        self.binders.push(ParameterBinder::Identity);
        self
    }

    /// Declares a required single-valued named parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.binders.push(ParameterBinder::named(name));
        self
    }

    /// Declares an optional single-valued named parameter.
    pub fn optional_param(mut self, name: impl Into<String>) -> Self {
        self.binders.push(ParameterBinder::optional(name));
        self
    }

    /// Declares a repeated named parameter, bound as an array.
    pub fn repeated_param(mut self, name: impl Into<String>) -> Self {
        self.binders.push(ParameterBinder::repeated(name));
        self
    }

    /// Declares a trailing catch-all parameter receiving the remaining
    /// container, disabling the consumption-completeness check.
    pub fn capture_rest(mut self) -> Self {
        self.binders.push(ParameterBinder::CaptureRest);
        self
    }

    /// Sets the canonical URL metadata.
    pub fn canonical_url(mut self, url: impl Into<String>) -> Self {
        self.canonical_url = Some(url.into());
        self
    }

    /// Sets the description metadata.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validates the declaration and freezes the descriptor.
    pub fn build(self) -> Result<OperationDescriptor> {
        if self.name.is_empty() {
            return Err(OperationError::invalid_signature(
                "<unnamed>",
                "operation name must not be empty",
            ));
        }

        let identity_count = self.binders.iter().filter(|b| b.is_identity()).count();
        if identity_count > 1 {
            return Err(OperationError::invalid_signature(
                self.name.as_str(),
                "identity parameter declared more than once",
            ));
        }
        if identity_count == 1 && !self.binders[0].is_identity() {
            return Err(OperationError::invalid_signature(
                self.name.as_str(),
                "identity must be the first parameter",
            ));
        }

        let capture_count = self.binders.iter().filter(|b| b.is_capture()).count();
        if capture_count > 1 {
            return Err(OperationError::invalid_signature(
                self.name.as_str(),
                "capture-rest parameter declared more than once",
            ));
        }
        if capture_count == 1 && !self.binders.last().is_some_and(ParameterBinder::is_capture) {
            return Err(OperationError::invalid_signature(
                self.name.as_str(),
                "capture-rest must be the last parameter",
            ));
        }

        let mut seen: Vec<&str> = Vec::new();
        for binder in &self.binders {
            if let Some(name) = binder.name() {
                if name.is_empty() {
                    return Err(OperationError::invalid_signature(
                        self.name.as_str(),
                        "parameter name must not be empty",
                    ));
                }
                if seen.contains(&name) {
                    return Err(OperationError::invalid_signature(
                        self.name.as_str(),
                        format!("parameter '{name}' declared more than once"),
                    ));
                }
                seen.push(name);
            }
        }

        let scope = if identity_count == 1 {
            OperationScope::Instance
        } else if self.resource_type.is_some() {
            OperationScope::Type
        } else {
            OperationScope::Server
        };

        Ok(OperationDescriptor {
            name: self.name,
            scope,
            resource_type: self.resource_type,
            binders: self.binders,
            canonical_url: self.canonical_url,
            description: self.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigil_stripped_from_name() {
        let d = OperationDescriptor::builder("$expand").build().unwrap();
        assert_eq!(d.name(), "expand");
    }

    #[test]
    fn test_scope_instance_when_identity_present() {
        let d = OperationDescriptor::builder("touch")
            .identity()
            .build()
            .unwrap();
        assert_eq!(d.scope(), OperationScope::Instance);

        // Identity wins even when a resource type is declared.
        let d = OperationDescriptor::builder("touch")
            .resource_type("Patient")
            .identity()
            .param("count")
            .build()
            .unwrap();
        assert_eq!(d.scope(), OperationScope::Instance);
    }

    #[test]
    fn test_scope_type_when_resource_type_declared() {
        let d = OperationDescriptor::builder("summarize")
            .resource_type("Patient")
            .param("count")
            .build()
            .unwrap();
        assert_eq!(d.scope(), OperationScope::Type);
        assert_eq!(d.resource_type(), Some("Patient"));
    }

    #[test]
    fn test_scope_server_by_default() {
        let d = OperationDescriptor::builder("stats").build().unwrap();
        assert_eq!(d.scope(), OperationScope::Server);
        assert_eq!(d.resource_type(), None);
    }

    #[test]
    fn test_identity_must_be_first() {
        let err = OperationDescriptor::builder("touch")
            .param("count")
            .identity()
            .build()
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidSignature { .. }));
    }

    #[test]
    fn test_identity_at_most_once() {
        let err = OperationDescriptor::builder("touch")
            .identity()
            .identity()
            .build()
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidSignature { .. }));
    }

    #[test]
    fn test_capture_rest_must_be_last() {
        let err = OperationDescriptor::builder("apply")
            .capture_rest()
            .param("subject")
            .build()
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidSignature { .. }));

        let ok = OperationDescriptor::builder("apply")
            .param("subject")
            .capture_rest()
            .build()
            .unwrap();
        assert!(ok.captures_rest());
    }

    #[test]
    fn test_capture_rest_at_most_once() {
        let err = OperationDescriptor::builder("apply")
            .capture_rest()
            .capture_rest()
            .build()
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidSignature { .. }));
    }

    #[test]
    fn test_duplicate_parameter_name_rejected() {
        let err = OperationDescriptor::builder("lookup")
            .param("code")
            .optional_param("code")
            .build()
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidSignature { .. }));
    }

    #[test]
    fn test_empty_operation_name_rejected() {
        assert!(OperationDescriptor::builder("").build().is_err());
        assert!(OperationDescriptor::builder("$").build().is_err());
    }

    #[test]
    fn test_applies_to_wildcard_without_type() {
        let untyped = OperationDescriptor::builder("validate").build().unwrap();
        assert!(untyped.applies_to("Patient"));
        assert!(untyped.applies_to("Observation"));

        let typed = OperationDescriptor::builder("summarize")
            .resource_type("Patient")
            .build()
            .unwrap();
        assert!(typed.applies_to("Patient"));
        assert!(!typed.applies_to("Observation"));
    }

    #[test]
    fn test_metadata_carried() {
        let d = OperationDescriptor::builder("summarize")
            .resource_type("Patient")
            .canonical_url("http://example.org/OperationDefinition/summarize")
            .description("Summarize a patient record")
            .build()
            .unwrap();

        assert_eq!(
            d.canonical_url(),
            Some("http://example.org/OperationDefinition/summarize")
        );
        assert_eq!(d.description(), Some("Summarize a patient record"));
    }

    #[test]
    fn test_descriptor_serializes() {
        let d = OperationDescriptor::builder("summarize")
            .resource_type("Patient")
            .param("count")
            .build()
            .unwrap();

        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["name"], "summarize");
        assert_eq!(json["scope"], "type");
    }
}
