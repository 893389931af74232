//! Running units of work, optionally across an isolation boundary.
//!
//! With [`IsolationMode::None`] a unit is materialized and run on the calling
//! thread. Any other mode reduces it to a [`TransportableSpec`], encodes it to
//! bytes and hands it to an [`IsolationBoundary`], which decodes, resolves and
//! runs it in a separate [`WorkerContext`].

use std::any::Any;
use std::sync::Arc;

use anvil_config::{IsolationMode, WorkerConfig};
use serde::de::DeserializeOwned;

use crate::action::ExecutionResult;
use crate::error::WorkError;
use crate::factory::ActionExecutionSpecFactory;
use crate::registry::ImplementationRegistry;
use crate::spec::{ActionExecutionSpec, SimpleSpec, TransportableSpec};

/// Receiving side of an isolation boundary.
pub trait IsolationBoundary: Send + Sync {
    /// Runs `spec` on the far side and waits for its result.
    fn submit(&self, spec: TransportableSpec) -> Result<ExecutionResult, WorkError>;
}

/// The implementations and conversions available to an execution context.
pub struct WorkerContext {
    registry: Arc<ImplementationRegistry>,
    factory: ActionExecutionSpecFactory,
}

impl WorkerContext {
    /// Creates a context resolving implementations in `registry`.
    pub fn new(registry: Arc<ImplementationRegistry>) -> Self {
        Self {
            registry,
            factory: ActionExecutionSpecFactory::default(),
        }
    }

    /// Decodes, resolves and runs a transportable unit.
    pub fn run(&self, spec: TransportableSpec) -> Result<ExecutionResult, WorkError> {
        self.registry.dispatch(&self.factory, spec)
    }
}

impl IsolationBoundary for WorkerContext {
    fn submit(&self, spec: TransportableSpec) -> Result<ExecutionResult, WorkError> {
        self.run(spec)
    }
}

/// Boundary that runs each unit on a dedicated thread.
///
/// The spec crosses as bytes, so nothing but its encoded form is shared with
/// the worker. A worker that panics is reported as
/// [`WorkError::DidNotComplete`].
pub struct ThreadBoundary {
    context: Arc<WorkerContext>,
}

impl ThreadBoundary {
    /// Creates a boundary whose workers run in `context`.
    pub fn new(context: Arc<WorkerContext>) -> Self {
        Self { context }
    }
}

impl IsolationBoundary for ThreadBoundary {
    fn submit(&self, spec: TransportableSpec) -> Result<ExecutionResult, WorkError> {
        let unit = spec.display_name.clone();
        let bytes = spec.to_bytes()?;
        let context = Arc::clone(&self.context);

        let handle = std::thread::Builder::new()
            .name(format!("anvil-worker: {unit}"))
            .spawn(move || -> Result<ExecutionResult, WorkError> {
                let spec = TransportableSpec::from_bytes(&bytes)?;
                context.run(spec)
            })
            .map_err(|e| WorkError::DidNotComplete {
                unit: unit.clone(),
                reason: format!("could not start worker thread: {e}"),
            })?;

        handle.join().unwrap_or_else(|payload| {
            Err(WorkError::DidNotComplete {
                unit,
                reason: format!("worker panicked: {}", panic_message(payload.as_ref())),
            })
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown cause"
    }
}

/// Submits units of work according to the configured isolation mode.
pub struct WorkerExecutor {
    factory: ActionExecutionSpecFactory,
    registry: Arc<ImplementationRegistry>,
    isolation: IsolationMode,
    boundary: Box<dyn IsolationBoundary>,
}

impl WorkerExecutor {
    /// Creates an executor for `registry` using the configured isolation.
    ///
    /// Both isolating modes start out with a [`ThreadBoundary`] sharing
    /// `registry`; use [`WorkerExecutor::with_boundary`] to plug in another.
    pub fn new(registry: Arc<ImplementationRegistry>, config: &WorkerConfig) -> Self {
        let context = Arc::new(WorkerContext::new(Arc::clone(&registry)));
        Self {
            factory: ActionExecutionSpecFactory::default(),
            registry,
            isolation: config.isolation,
            boundary: Box::new(ThreadBoundary::new(context)),
        }
    }

    /// Replaces the boundary used by isolating modes.
    pub fn with_boundary(mut self, boundary: Box<dyn IsolationBoundary>) -> Self {
        self.boundary = boundary;
        self
    }

    /// Returns the factory used to build and convert specs.
    pub fn factory(&self) -> &ActionExecutionSpecFactory {
        &self.factory
    }

    /// Returns the configured isolation mode.
    pub fn isolation(&self) -> IsolationMode {
        self.isolation
    }

    /// Runs a unit of work to completion.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(unit = spec.display_name(), isolation = ?self.isolation)
    )]
    pub fn submit<P: DeserializeOwned + 'static>(
        &self,
        spec: ActionExecutionSpec<P>,
    ) -> Result<ExecutionResult, WorkError> {
        if self.isolation.crosses_boundary() {
            let transportable = self.factory.to_transportable(spec)?;
            self.boundary.submit(transportable)
        } else {
            let simple = self.factory.to_simple(spec, &self.registry)?;
            self.execute(simple)
        }
    }

    /// Runs a unit that is already in the current context.
    pub fn execute<P>(&self, spec: SimpleSpec<P>) -> Result<ExecutionResult, WorkError> {
        spec.execute()
    }
}
