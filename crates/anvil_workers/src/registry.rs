//! Lookup of work implementations by identity.
//!
//! Each execution context owns an [`ImplementationRegistry`]. A
//! [`TransportableSpec`] names its implementation by identity only; the
//! receiving context resolves that identity here before the unit can run.

use std::any::Any;
use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::action::{ExecutionResult, Implementation};
use crate::error::WorkError;
use crate::factory::ActionExecutionSpecFactory;
use crate::spec::TransportableSpec;

type Dispatch = fn(
    &ImplementationRegistry,
    &ActionExecutionSpecFactory,
    TransportableSpec,
) -> Result<ExecutionResult, WorkError>;

struct Entry {
    /// Holds an `Implementation<P>` for the registered `P`.
    implementation: Box<dyn Any + Send + Sync>,
    parameter_type: &'static str,
    dispatch: Dispatch,
}

/// Implementations known to one execution context.
pub struct ImplementationRegistry {
    name: String,
    entries: HashMap<String, Entry>,
}

impl ImplementationRegistry {
    /// Creates an empty registry for the named context.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Describes the context for diagnostics.
    pub fn context(&self) -> String {
        format!("implementation registry '{}'", self.name)
    }

    /// Registers an implementation under its identity.
    ///
    /// A later registration under the same identity replaces the earlier one.
    pub fn register<P>(&mut self, implementation: Implementation<P>)
    where
        P: DeserializeOwned + 'static,
    {
        let identity = implementation.identity().to_string();
        let entry = Entry {
            implementation: Box::new(implementation),
            parameter_type: std::any::type_name::<P>(),
            dispatch: dispatch_as::<P>,
        };
        if self.entries.insert(identity.clone(), entry).is_some() {
            tracing::warn!(%identity, context = %self.name, "replacing registered implementation");
        }
    }

    /// Returns whether `identity` is registered.
    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    /// Returns the number of registered implementations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves `identity` to an implementation taking parameters `P`.
    ///
    /// `unit` names the unit of work being resolved for diagnostics.
    pub fn resolve<P: 'static>(
        &self,
        unit: &str,
        identity: &str,
    ) -> Result<Implementation<P>, WorkError> {
        let entry = self.entry(unit, identity)?;
        entry
            .implementation
            .downcast_ref::<Implementation<P>>()
            .cloned()
            .ok_or_else(|| {
                let reason = format!(
                    "registered for parameters `{}`, not `{}`",
                    entry.parameter_type,
                    std::any::type_name::<P>()
                );
                self.unresolved(unit, identity, reason)
            })
    }

    /// Converts and runs a transportable unit with the implementation its
    /// identity names.
    pub fn dispatch(
        &self,
        factory: &ActionExecutionSpecFactory,
        spec: TransportableSpec,
    ) -> Result<ExecutionResult, WorkError> {
        let dispatch = self
            .entry(&spec.display_name, &spec.implementation_identity)?
            .dispatch;
        dispatch(self, factory, spec)
    }

    fn entry(&self, unit: &str, identity: &str) -> Result<&Entry, WorkError> {
        self.entries.get(identity).ok_or_else(|| {
            self.unresolved(
                unit,
                identity,
                "no implementation registered under this identity".to_string(),
            )
        })
    }

    fn unresolved(&self, unit: &str, identity: &str, reason: String) -> WorkError {
        WorkError::Resolution {
            unit: unit.to_string(),
            identity: identity.to_string(),
            context: self.context(),
            reason,
        }
    }
}

fn dispatch_as<P: DeserializeOwned + 'static>(
    registry: &ImplementationRegistry,
    factory: &ActionExecutionSpecFactory,
    spec: TransportableSpec,
) -> Result<ExecutionResult, WorkError> {
    factory.to_simple::<P>(spec.into(), registry)?.execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionFailure, WorkAction};

    struct CountWords;

    impl WorkAction<String> for CountWords {
        fn execute(&self, parameters: String) -> Result<ExecutionResult, ActionFailure> {
            Ok(ExecutionResult {
                did_work: parameters.split_whitespace().count() > 0,
            })
        }
    }

    fn registry() -> ImplementationRegistry {
        let mut registry = ImplementationRegistry::new("test");
        registry.register(Implementation::<String>::of(CountWords));
        registry
    }

    fn identity() -> &'static str {
        std::any::type_name::<CountWords>()
    }

    #[test]
    fn resolves_registered_identity() {
        let registry = registry();
        assert!(registry.contains(identity()));
        assert_eq!(registry.len(), 1);
        let implementation = registry.resolve::<String>("count", identity()).unwrap();
        assert_eq!(implementation.identity(), identity());
        assert!(implementation.execute("a b".to_string()).unwrap().did_work);
    }

    #[test]
    fn unknown_identity_names_identity_and_context() {
        let err = registry()
            .resolve::<String>("count", "app::Missing")
            .unwrap_err();
        match err {
            WorkError::Resolution {
                unit,
                identity,
                context,
                ..
            } => {
                assert_eq!(unit, "count");
                assert_eq!(identity, "app::Missing");
                assert_eq!(context, "implementation registry 'test'");
            }
            other => panic!("expected resolution fault, got {other:?}"),
        }
    }

    #[test]
    fn wrong_parameter_type_is_resolution_fault() {
        let err = registry().resolve::<u32>("count", identity()).unwrap_err();
        assert!(matches!(err, WorkError::Resolution { .. }));
        assert!(err.to_string().contains("registered for parameters"));
    }

    #[test]
    fn later_registration_replaces() {
        let mut registry = registry();
        registry.register(Implementation::<String>::of(CountWords));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
