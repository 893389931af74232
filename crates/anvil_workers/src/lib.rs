//! Isolated work execution.
//!
//! A unit of work is described once as an [`IsolatedSpec`] holding a deep
//! snapshot of its parameters, optionally reduced to a [`TransportableSpec`]
//! (bytes plus an implementation identity) to cross an isolation boundary,
//! and turned into a [`SimpleSpec`] right before it runs. The
//! [`ActionExecutionSpecFactory`] owns every conversion between the three
//! forms.

#![warn(missing_docs)]

pub mod action;
pub mod classloader;
pub mod codec;
pub mod error;
pub mod executor;
pub mod factory;
pub mod isolation;
pub mod registry;
pub mod spec;
pub mod value;

pub use action::{ActionFailure, ExecutionResult, Implementation, WorkAction};
pub use classloader::{ClassLoaderStructure, LoaderSpec};
pub use codec::IsolatableSerializerRegistry;
pub use error::{SerializationPhase, WorkError};
pub use executor::{IsolationBoundary, ThreadBoundary, WorkerContext, WorkerExecutor};
pub use factory::ActionExecutionSpecFactory;
pub use isolation::{Isolatable, IsolatableFactory};
pub use registry::ImplementationRegistry;
pub use spec::{ActionExecutionSpec, IsolatedSpec, SimpleSpec, TransportableSpec};
pub use value::{IsolatedValue, ValueError};
