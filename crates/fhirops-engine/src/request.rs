//! The caller-supplied invocation request.
//!
//! A request bundles the context, operation name, optional target identity,
//! optional resource type, and the parameter container. It is built per
//! call, handed to `OperationRegistry::execute`, and discarded. The
//! container is borrowed: the engine binds against its own clone, so the
//! caller's copy is never mutated.

use fhirops_core::{Parameters, Reference};

use crate::descriptor::OperationScope;

/// One operation invocation.
#[derive(Debug)]
pub struct InvocationRequest<'a, C> {
    context: &'a C,
    operation: String,
    identity: Option<String>,
    resource_type: Option<String>,
    parameters: Option<&'a Parameters>,
}

impl<'a, C> InvocationRequest<'a, C> {
    /// Creates a server-scoped request; a leading `$` sigil is stripped.
    pub fn new(context: &'a C, operation: impl Into<String>) -> Self {
        let operation = operation.into();
        let operation = operation.strip_prefix('$').unwrap_or(&operation).to_string();
        Self {
            context,
            operation,
            identity: None,
            resource_type: None,
            parameters: None,
        }
    }

    /// Targets a specific instance, making the request instance-scoped.
    pub fn on_instance(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Targets a resource type, making the request type-scoped unless an
    /// identity is also set.
    pub fn on_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Supplies the parameter container.
    pub fn with_parameters(mut self, parameters: &'a Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn context(&self) -> &'a C {
        self.context
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    pub fn parameters(&self) -> Option<&'a Parameters> {
        self.parameters
    }

    /// The request's effective scope: instance if an identity is set, else
    /// type if a resource type is set, else server.
    pub fn scope(&self) -> OperationScope {
        if self.identity.is_some() {
            OperationScope::Instance
        } else if self.resource_type.is_some() {
            OperationScope::Type
        } else {
            OperationScope::Server
        }
    }

    /// The resource type used to narrow candidate operations.
    ///
    /// An explicit resource type wins; otherwise an identity of the form
    /// `Type/id` contributes its type. Opaque identities contribute nothing.
    pub(crate) fn type_filter(&self) -> Option<String> {
        if let Some(resource_type) = &self.resource_type {
            return Some(resource_type.clone());
        }
        self.identity
            .as_deref()
            .and_then(|id| id.parse::<Reference>().ok())
            .map(|r| r.resource_type)
    }
}
