//! Handler trait, per-call factories, and the provider registration seam.
//!
//! A closure pairs one descriptor with a factory that builds a fresh handler
//! from the request context. Handlers are never cached or reused across
//! calls, so concurrent dispatches cannot observe each other's state.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::descriptor::OperationDescriptor;

/// A live operation handler, constructed per dispatched call.
///
/// `args` is the positional argument list produced by the binders: the
/// identity first for instance-scoped operations, then each declared
/// parameter in order.
pub trait OperationHandler {
    fn invoke(&mut self, args: Vec<Value>) -> anyhow::Result<Value>;
}

/// Factory producing a fresh handler from the request context.
pub type HandlerFactory<C> = Arc<dyn Fn(&C) -> Box<dyn OperationHandler> + Send + Sync>;

/// The pairing of an operation's metadata with the factory able to produce
/// a live handler for a given request.
pub struct OperationClosure<C> {
    descriptor: Arc<OperationDescriptor>,
    factory: HandlerFactory<C>,
}

impl<C> OperationClosure<C> {
    /// Creates a closure from a descriptor and a handler factory.
    pub fn new<F>(descriptor: OperationDescriptor, factory: F) -> Self
    where
        F: Fn(&C) -> Box<dyn OperationHandler> + Send + Sync + 'static,
    {
        Self {
            descriptor: Arc::new(descriptor),
            factory: Arc::new(factory),
        }
    }

    /// The descriptor this closure dispatches under.
    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    /// Builds a fresh handler instance for one call.
    pub(crate) fn instantiate(&self, context: &C) -> Box<dyn OperationHandler> {
        (self.factory)(context)
    }
}

impl<C> Clone for OperationClosure<C> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<C> fmt::Debug for OperationClosure<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationClosure")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Registration seam for handler modules.
///
/// Each module implementing operations exposes them through this trait;
/// the registry builder collects the closures at startup. A provider that
/// yields no operations is a registration error.
pub trait OperationProvider<C> {
    /// Identifier used in registration errors and logs.
    fn provider_name(&self) -> &str;

    /// The operations this provider contributes.
    fn operations(&self) -> Vec<OperationClosure<C>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingHandler {
        instance: u32,
    }

    impl OperationHandler for CountingHandler {
        fn invoke(&mut self, _args: Vec<Value>) -> anyhow::Result<Value> {
            Ok(json!(self.instance))
        }
    }

    #[test]
    fn test_factory_builds_fresh_instance_per_call() {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let descriptor = OperationDescriptor::builder("ping").build().unwrap();
        let closure = OperationClosure::new(descriptor, |_ctx: &()| {
            Box::new(CountingHandler {
                instance: COUNTER.fetch_add(1, Ordering::SeqCst),
            }) as Box<dyn OperationHandler>
        });

        let first = closure.instantiate(&()).invoke(vec![]).unwrap();
        let second = closure.instantiate(&()).invoke(vec![]).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_closure_clone_shares_descriptor() {
        let descriptor = OperationDescriptor::builder("ping").build().unwrap();
        let closure = OperationClosure::new(descriptor, |_ctx: &()| {
            Box::new(CountingHandler { instance: 0 }) as Box<dyn OperationHandler>
        });

        let copy = closure.clone();
        assert_eq!(copy.descriptor(), closure.descriptor());
    }
}
