//! Work actions and the handles that name them.

use std::fmt;
use std::sync::Arc;

/// Outcome of running a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    /// Whether the action did anything.
    pub did_work: bool,
}

impl ExecutionResult {
    /// A result for an action that did work.
    pub fn did_work() -> Self {
        Self { did_work: true }
    }

    /// A result for an action that found nothing to do.
    pub fn up_to_date() -> Self {
        Self { did_work: false }
    }
}

/// Failure reported by a [`WorkAction`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ActionFailure {
    /// What went wrong.
    pub message: String,
}

impl ActionFailure {
    /// Creates a failure with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An implementation of a unit of work taking parameters `P`.
///
/// Implementations are registered once per execution context and are
/// shared across every unit of work that names them.
pub trait WorkAction<P>: Send + Sync {
    /// Runs the action with freshly materialized parameters.
    fn execute(&self, parameters: P) -> Result<ExecutionResult, ActionFailure>;
}

/// A resolved implementation together with its stable identity.
pub struct Implementation<P> {
    identity: String,
    action: Arc<dyn WorkAction<P>>,
}

impl<P> Implementation<P> {
    /// Wraps `action` under its type name.
    pub fn of<A: WorkAction<P> + 'static>(action: A) -> Self {
        Self::named(std::any::type_name::<A>(), action)
    }

    /// Wraps `action` under an explicit identity.
    pub fn named<A: WorkAction<P> + 'static>(identity: impl Into<String>, action: A) -> Self {
        Self {
            identity: identity.into(),
            action: Arc::new(action),
        }
    }

    /// Returns the identity used to resolve this implementation across an
    /// isolation boundary.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Runs the action.
    pub fn execute(&self, parameters: P) -> Result<ExecutionResult, ActionFailure> {
        self.action.execute(parameters)
    }
}

impl<P> Clone for Implementation<P> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            action: Arc::clone(&self.action),
        }
    }
}

impl<P> fmt::Debug for Implementation<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Implementation").field(&self.identity).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl WorkAction<bool> for Echo {
        fn execute(&self, parameters: bool) -> Result<ExecutionResult, ActionFailure> {
            if parameters {
                Ok(ExecutionResult::did_work())
            } else {
                Err(ActionFailure::new("asked to fail"))
            }
        }
    }

    #[test]
    fn default_identity_is_type_name() {
        let implementation = Implementation::<bool>::of(Echo);
        assert!(implementation.identity().ends_with("Echo"));
    }

    #[test]
    fn named_identity() {
        let implementation = Implementation::<bool>::named("echo", Echo);
        assert_eq!(implementation.identity(), "echo");
        assert_eq!(format!("{implementation:?}"), "Implementation(\"echo\")");
    }

    #[test]
    fn execute_forwards_to_action() {
        let implementation = Implementation::<bool>::of(Echo);
        assert_eq!(implementation.execute(true), Ok(ExecutionResult::did_work()));
        assert_eq!(
            implementation.execute(false).unwrap_err().to_string(),
            "asked to fail"
        );
    }

    struct CountChars;

    impl<'a> WorkAction<&'a str> for CountChars {
        fn execute(&self, parameters: &'a str) -> Result<ExecutionResult, ActionFailure> {
            Ok(ExecutionResult {
                did_work: !parameters.is_empty(),
            })
        }
    }

    fn run_once<P>(implementation: &Implementation<P>, parameters: P) -> ExecutionResult {
        implementation.execute(parameters).unwrap()
    }

    #[test]
    fn borrowed_parameters_need_no_static_bound() {
        let owned = String::from("src/Main.java");
        let implementation = Implementation::<&str>::of(CountChars);
        assert!(run_once(&implementation, owned.as_str()).did_work);
        assert!(!run_once(&implementation.clone(), &owned[..0]).did_work);
    }
}
