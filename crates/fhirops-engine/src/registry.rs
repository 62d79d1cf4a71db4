//! Operation registry: two-phase registration and dispatch.
//!
//! Registration runs through [`RegistryBuilder`], which accumulates closures
//! keyed by operation name and produces an immutable [`OperationRegistry`].
//! Dispatch (`execute`) resolves the unique closure matching name, scope and
//! resource type, builds a fresh handler, binds the parameters against a
//! private clone of the container, and invokes it. There is no mutation
//! path after `build`, so concurrent dispatch needs no locking.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use fhirops_core::Parameters;

use crate::descriptor::{OperationDescriptor, OperationScope};
use crate::error::{OperationError, Result};
use crate::provider::{OperationClosure, OperationProvider};
use crate::request::InvocationRequest;

// ============================================================================
// Builder
// ============================================================================

/// Accumulates operation registrations before the serve phase.
pub struct RegistryBuilder<C> {
    closures: IndexMap<String, Vec<OperationClosure<C>>>,
    reject_duplicates: bool,
}

impl<C> RegistryBuilder<C> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            closures: IndexMap::new(),
            reject_duplicates: false,
        }
    }

    /// Makes `build` fail when two registrations share name, scope and
    /// resource type. Off by default: duplicates then surface as an
    /// ambiguous-operation error at dispatch.
    pub fn reject_duplicates(mut self, reject: bool) -> Self {
        self.reject_duplicates = reject;
        self
    }

    /// Registers every operation a provider contributes.
    ///
    /// Fails if the provider yields none; a silent no-op registration would
    /// hide a wiring defect.
    pub fn register(&mut self, provider: &dyn OperationProvider<C>) -> Result<()> {
        let closures = provider.operations();
        if closures.is_empty() {
            return Err(OperationError::no_operations_found(provider.provider_name()));
        }

        for closure in closures {
            self.register_closure(closure);
        }
        Ok(())
    }

    /// Registers a single closure.
    pub fn register_closure(&mut self, closure: OperationClosure<C>) {
        let descriptor = closure.descriptor();
        debug!(
            operation = %descriptor.name(),
            scope = %descriptor.scope(),
            resource_type = descriptor.resource_type().unwrap_or("-"),
            "registering operation"
        );
        self.closures
            .entry(descriptor.name().to_string())
            .or_default()
            .push(closure);
    }

    /// Freezes the registrations into an immutable registry.
    pub fn build(self) -> Result<OperationRegistry<C>> {
        if self.reject_duplicates {
            for (name, closures) in &self.closures {
                for (i, a) in closures.iter().enumerate() {
                    let da = a.descriptor();
                    let count = closures[i + 1..]
                        .iter()
                        .filter(|b| {
                            let db = b.descriptor();
                            da.scope() == db.scope() && da.resource_type() == db.resource_type()
                        })
                        .count();
                    if count > 0 {
                        return Err(OperationError::AmbiguousOperation {
                            operation: name.clone(),
                            count: count + 1,
                        });
                    }
                }
            }
        }

        Ok(OperationRegistry {
            closures: self.closures,
        })
    }
}

impl<C> Default for RegistryBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for RegistryBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("operations", &self.closures.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable table of registered operations, keyed by name.
pub struct OperationRegistry<C> {
    closures: IndexMap<String, Vec<OperationClosure<C>>>,
}

impl<C> OperationRegistry<C> {
    /// Starts a new registration phase.
    pub fn builder() -> RegistryBuilder<C> {
        RegistryBuilder::new()
    }

    /// Total number of registered closures.
    pub fn len(&self) -> usize {
        self.closures.values().map(Vec::len).sum()
    }

    /// Returns true if no operations are registered.
    pub fn is_empty(&self) -> bool {
        self.closures.is_empty()
    }

    /// Returns true if any registration exists under the name (the `$`
    /// sigil is ignored).
    pub fn contains(&self, name: &str) -> bool {
        self.closures
            .contains_key(name.strip_prefix('$').unwrap_or(name))
    }

    /// Every registered descriptor, in registration order.
    pub fn operations(&self) -> Vec<&OperationDescriptor> {
        self.closures
            .values()
            .flatten()
            .map(|c| c.descriptor())
            .collect()
    }

    /// Server-scoped descriptors.
    pub fn server_operations(&self) -> Vec<&OperationDescriptor> {
        self.operations()
            .into_iter()
            .filter(|d| d.scope() == OperationScope::Server)
            .collect()
    }

    /// Type-scoped descriptors applying to the given resource type.
    pub fn type_operations(&self, resource_type: &str) -> Vec<&OperationDescriptor> {
        self.operations()
            .into_iter()
            .filter(|d| d.scope() == OperationScope::Type && d.applies_to(resource_type))
            .collect()
    }

    /// Instance-scoped descriptors applying to the given resource type.
    pub fn instance_operations(&self, resource_type: &str) -> Vec<&OperationDescriptor> {
        self.operations()
            .into_iter()
            .filter(|d| d.scope() == OperationScope::Instance && d.applies_to(resource_type))
            .collect()
    }

    /// Resolves, binds and invokes the operation the request names.
    ///
    /// Resolution narrows the candidates in three steps: name, effective
    /// scope, then resource type (exact matches are preferred over
    /// descriptors that apply to every type). Exactly one closure must
    /// remain; the handler is then built fresh from the request context and
    /// the binders run against a clone of the supplied container.
    pub fn execute(&self, request: InvocationRequest<'_, C>) -> Result<Value> {
        let operation = request.operation().to_string();

        let candidates = self
            .closures
            .get(&operation)
            .ok_or_else(|| OperationError::unknown_operation(operation.as_str()))?;

        let scope = request.scope();
        let scoped: Vec<&OperationClosure<C>> = candidates
            .iter()
            .filter(|c| c.descriptor().scope() == scope)
            .collect();
        if scoped.is_empty() {
            return Err(OperationError::no_operation_for_scope(
                operation.as_str(),
                scope,
            ));
        }

        let selected: Vec<&OperationClosure<C>> = match request.type_filter() {
            Some(resource_type) => {
                let exact: Vec<&OperationClosure<C>> = scoped
                    .iter()
                    .copied()
                    .filter(|c| c.descriptor().resource_type() == Some(resource_type.as_str()))
                    .collect();
                let tier = if exact.is_empty() {
                    scoped
                        .iter()
                        .copied()
                        .filter(|c| c.descriptor().resource_type().is_none())
                        .collect()
                } else {
                    exact
                };
                if tier.is_empty() {
                    return Err(OperationError::no_operation_for_type(
                        operation.as_str(),
                        resource_type,
                    ));
                }
                tier
            }
            None => scoped,
        };

        if selected.len() > 1 {
            warn!(
                operation = %operation,
                scope = %scope,
                count = selected.len(),
                "ambiguous operation registration"
            );
            return Err(OperationError::AmbiguousOperation {
                operation,
                count: selected.len(),
            });
        }

        let closure = selected[0];
        let descriptor = closure.descriptor();
        debug!(
            operation = %operation,
            scope = %scope,
            "dispatching operation"
        );

        let mut handler = closure.instantiate(request.context());

        // Bind against a private clone; the caller's container stays intact.
        let mut remaining = request.parameters().cloned().unwrap_or_default();
        let mut args = Vec::with_capacity(descriptor.binders().len());
        for binder in descriptor.binders() {
            args.push(binder.bind(&operation, request.identity(), &mut remaining)?);
        }

        if !remaining.is_empty() {
            let mut names: Vec<String> = Vec::new();
            for name in remaining.names() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            return Err(OperationError::UnconsumedParameters { operation, names });
        }

        handler
            .invoke(args)
            .map_err(move |source| OperationError::invocation_failed(operation, source))
    }
}

impl<C> fmt::Debug for OperationRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.closures.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::OperationHandler;
    use serde_json::json;

    struct EchoHandler;

    impl OperationHandler for EchoHandler {
        fn invoke(&mut self, args: Vec<Value>) -> anyhow::Result<Value> {
            Ok(Value::Array(args))
        }
    }

    fn echo_closure(descriptor: OperationDescriptor) -> OperationClosure<()> {
        OperationClosure::new(descriptor, |_ctx: &()| {
            Box::new(EchoHandler) as Box<dyn OperationHandler>
        })
    }

    struct EmptyProvider;

    impl OperationProvider<()> for EmptyProvider {
        fn provider_name(&self) -> &str {
            "empty"
        }

        fn operations(&self) -> Vec<OperationClosure<()>> {
            Vec::new()
        }
    }

    #[test]
    fn test_empty_provider_rejected() {
        let mut builder = RegistryBuilder::new();
        let err = builder.register(&EmptyProvider).unwrap_err();
        assert!(matches!(err, OperationError::NoOperationsFound { .. }));
    }

    #[test]
    fn test_unknown_operation() {
        let registry = RegistryBuilder::<()>::new().build().unwrap();
        let err = registry
            .execute(InvocationRequest::new(&(), "nope"))
            .unwrap_err();
        assert!(matches!(err, OperationError::UnknownOperation { .. }));
    }

    #[test]
    fn test_scope_mismatch() {
        let mut builder = RegistryBuilder::new();
        builder.register_closure(echo_closure(
            OperationDescriptor::builder("touch").identity().build().unwrap(),
        ));
        let registry = builder.build().unwrap();

        // Instance-only operation invoked without an identity.
        let err = registry
            .execute(InvocationRequest::new(&(), "touch"))
            .unwrap_err();
        assert!(matches!(err, OperationError::NoOperationForScope { .. }));
    }

    #[test]
    fn test_type_mismatch() {
        let mut builder = RegistryBuilder::new();
        builder.register_closure(echo_closure(
            OperationDescriptor::builder("summarize")
                .resource_type("Patient")
                .build()
                .unwrap(),
        ));
        let registry = builder.build().unwrap();

        let err = registry
            .execute(InvocationRequest::new(&(), "summarize").on_type("Observation"))
            .unwrap_err();
        assert!(matches!(err, OperationError::NoOperationForType { .. }));
    }

    #[test]
    fn test_type_filter_selects_the_matching_registration() {
        let mut builder = RegistryBuilder::new();
        builder.register_closure(echo_closure(
            OperationDescriptor::builder("validate")
                .resource_type("Patient")
                .param("mode")
                .build()
                .unwrap(),
        ));
        builder.register_closure(echo_closure(
            OperationDescriptor::builder("validate")
                .resource_type("Observation")
                .build()
                .unwrap(),
        ));
        let registry = builder.build().unwrap();

        let params = Parameters::from_pairs([("mode", json!("create"))]);
        let result = registry
            .execute(
                InvocationRequest::new(&(), "validate")
                    .on_type("Patient")
                    .with_parameters(&params),
            )
            .unwrap();
        assert_eq!(result, json!(["create"]));
    }

    #[test]
    fn test_ambiguous_dispatch() {
        let mut builder = RegistryBuilder::new();
        let descriptor = || {
            OperationDescriptor::builder("summarize")
                .resource_type("Patient")
                .build()
                .unwrap()
        };
        builder.register_closure(echo_closure(descriptor()));
        builder.register_closure(echo_closure(descriptor()));
        let registry = builder.build().unwrap();

        let err = registry
            .execute(InvocationRequest::new(&(), "summarize").on_type("Patient"))
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::AmbiguousOperation { count: 2, .. }
        ));
    }

    #[test]
    fn test_reject_duplicates_at_build() {
        let mut builder = RegistryBuilder::new().reject_duplicates(true);
        let descriptor = || {
            OperationDescriptor::builder("summarize")
                .resource_type("Patient")
                .build()
                .unwrap()
        };
        builder.register_closure(echo_closure(descriptor()));
        builder.register_closure(echo_closure(descriptor()));

        let err = builder.build().unwrap_err();
        assert!(matches!(err, OperationError::AmbiguousOperation { .. }));
    }

    #[test]
    fn test_same_name_different_scopes_coexist() {
        let mut builder = RegistryBuilder::new().reject_duplicates(true);
        builder.register_closure(echo_closure(
            OperationDescriptor::builder("everything")
                .identity()
                .build()
                .unwrap(),
        ));
        builder.register_closure(echo_closure(
            OperationDescriptor::builder("everything")
                .resource_type("Patient")
                .build()
                .unwrap(),
        ));
        let registry = builder.build().unwrap();

        let instance = registry
            .execute(InvocationRequest::new(&(), "everything").on_instance("Patient/1"))
            .unwrap();
        assert_eq!(instance, json!(["Patient/1"]));

        let type_level = registry
            .execute(InvocationRequest::new(&(), "everything").on_type("Patient"))
            .unwrap();
        assert_eq!(type_level, json!([]));
    }

    #[test]
    fn test_catalog_queries() {
        let mut builder = RegistryBuilder::new();
        builder.register_closure(echo_closure(
            OperationDescriptor::builder("stats").build().unwrap(),
        ));
        builder.register_closure(echo_closure(
            OperationDescriptor::builder("summarize")
                .resource_type("Patient")
                .build()
                .unwrap(),
        ));
        builder.register_closure(echo_closure(
            OperationDescriptor::builder("touch").identity().build().unwrap(),
        ));
        let registry = builder.build().unwrap();

        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
        assert!(registry.contains("stats"));
        assert!(registry.contains("$stats"));
        assert!(!registry.contains("missing"));

        assert_eq!(registry.server_operations().len(), 1);
        assert_eq!(registry.type_operations("Patient").len(), 1);
        assert_eq!(registry.type_operations("Observation").len(), 0);
        // Untyped instance operations apply to every resource type.
        assert_eq!(registry.instance_operations("Patient").len(), 1);

        let names: Vec<&str> = registry.operations().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["stats", "summarize", "touch"]);
    }
}
