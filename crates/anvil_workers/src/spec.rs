//! The three forms a unit of work takes on its way to execution.

use serde::{Deserialize, Serialize};

use crate::action::{ExecutionResult, Implementation};
use crate::classloader::ClassLoaderStructure;
use crate::error::WorkError;
use crate::isolation::Isolatable;

/// A unit of work with its parameters captured as a deep snapshot.
///
/// Only [`ActionExecutionSpecFactory::new_isolated_spec`] creates one.
///
/// [`ActionExecutionSpecFactory::new_isolated_spec`]: crate::ActionExecutionSpecFactory::new_isolated_spec
#[derive(Debug, Clone)]
pub struct IsolatedSpec<P> {
    pub(crate) display_name: String,
    pub(crate) implementation: Implementation<P>,
    pub(crate) parameters: Isolatable<P>,
    pub(crate) class_loader_structure: Option<ClassLoaderStructure>,
}

impl<P> IsolatedSpec<P> {
    /// Returns the human-readable name of the unit.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the implementation that will run the unit.
    pub fn implementation(&self) -> &Implementation<P> {
        &self.implementation
    }

    /// Returns the parameter snapshot.
    pub fn parameters(&self) -> &Isolatable<P> {
        &self.parameters
    }

    /// Returns the code-loading structure, if one was given.
    pub fn class_loader_structure(&self) -> Option<&ClassLoaderStructure> {
        self.class_loader_structure.as_ref()
    }
}

/// A unit of work reduced to plain data that may cross an isolation
/// boundary.
///
/// The implementation is named, not held, and the parameters are opaque
/// bytes written by [`IsolatableSerializerRegistry`].
///
/// [`IsolatableSerializerRegistry`]: crate::IsolatableSerializerRegistry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportableSpec {
    /// Human-readable name of the unit.
    pub display_name: String,
    /// Identity the receiving side resolves the implementation by.
    pub implementation_identity: String,
    /// Encoded parameter snapshot.
    pub serialized_parameters: Vec<u8>,
    /// Code-loading structure for the receiving side.
    pub class_loader_structure: Option<ClassLoaderStructure>,
}

impl TransportableSpec {
    /// Encodes the whole spec for a byte channel.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WorkError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| {
                WorkError::encode(std::any::type_name::<Self>(), e).in_unit(&self.display_name)
            })
    }

    /// Decodes a spec written by [`TransportableSpec::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WorkError> {
        let (spec, _): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| WorkError::decode(std::any::type_name::<Self>(), e))?;
        Ok(spec)
    }
}

/// A unit of work ready to run in the current context.
#[derive(Debug)]
pub struct SimpleSpec<P> {
    pub(crate) display_name: String,
    pub(crate) implementation: Implementation<P>,
    pub(crate) parameters: P,
    pub(crate) class_loader_structure: Option<ClassLoaderStructure>,
}

impl<P> SimpleSpec<P> {
    /// Returns the human-readable name of the unit.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the implementation that will run the unit.
    pub fn implementation(&self) -> &Implementation<P> {
        &self.implementation
    }

    /// Returns the live parameters.
    pub fn parameters(&self) -> &P {
        &self.parameters
    }

    /// Returns the code-loading structure, if one was given.
    pub fn class_loader_structure(&self) -> Option<&ClassLoaderStructure> {
        self.class_loader_structure.as_ref()
    }

    /// Runs the unit, consuming its parameters.
    pub fn execute(self) -> Result<ExecutionResult, WorkError> {
        tracing::debug!(
            unit = %self.display_name,
            implementation = self.implementation.identity(),
            "executing unit of work"
        );
        self.implementation
            .execute(self.parameters)
            .map_err(|failure| WorkError::ActionFailed {
                unit: self.display_name,
                reason: failure.message,
            })
    }
}

/// A unit of work in any of its three forms.
#[derive(Debug)]
pub enum ActionExecutionSpec<P> {
    /// Parameters snapshotted, implementation held.
    Isolated(IsolatedSpec<P>),
    /// Parameters encoded, implementation named.
    Transportable(TransportableSpec),
    /// Parameters live, ready to run.
    Simple(SimpleSpec<P>),
}

impl<P> ActionExecutionSpec<P> {
    /// Returns the human-readable name of the unit.
    pub fn display_name(&self) -> &str {
        match self {
            ActionExecutionSpec::Isolated(s) => &s.display_name,
            ActionExecutionSpec::Transportable(s) => &s.display_name,
            ActionExecutionSpec::Simple(s) => &s.display_name,
        }
    }

    /// Returns the implementation identity.
    pub fn implementation_identity(&self) -> &str {
        match self {
            ActionExecutionSpec::Isolated(s) => s.implementation.identity(),
            ActionExecutionSpec::Transportable(s) => &s.implementation_identity,
            ActionExecutionSpec::Simple(s) => s.implementation.identity(),
        }
    }

    /// Returns the code-loading structure, if one was given.
    pub fn class_loader_structure(&self) -> Option<&ClassLoaderStructure> {
        match self {
            ActionExecutionSpec::Isolated(s) => s.class_loader_structure.as_ref(),
            ActionExecutionSpec::Transportable(s) => s.class_loader_structure.as_ref(),
            ActionExecutionSpec::Simple(s) => s.class_loader_structure.as_ref(),
        }
    }

    /// Names the form of this spec.
    pub fn shape(&self) -> &'static str {
        match self {
            ActionExecutionSpec::Isolated(_) => "isolated",
            ActionExecutionSpec::Transportable(_) => "transportable",
            ActionExecutionSpec::Simple(_) => "simple",
        }
    }
}

impl<P> From<IsolatedSpec<P>> for ActionExecutionSpec<P> {
    fn from(spec: IsolatedSpec<P>) -> Self {
        ActionExecutionSpec::Isolated(spec)
    }
}

impl<P> From<TransportableSpec> for ActionExecutionSpec<P> {
    fn from(spec: TransportableSpec) -> Self {
        ActionExecutionSpec::Transportable(spec)
    }
}

impl<P> From<SimpleSpec<P>> for ActionExecutionSpec<P> {
    fn from(spec: SimpleSpec<P>) -> Self {
        ActionExecutionSpec::Simple(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transportable() -> TransportableSpec {
        TransportableSpec {
            display_name: "render docs".to_string(),
            implementation_identity: "app::Render".to_string(),
            serialized_parameters: vec![1, 2, 3],
            class_loader_structure: None,
        }
    }

    #[test]
    fn bytes_round_trip() {
        let spec = transportable();
        let back = TransportableSpec::from_bytes(&spec.to_bytes().unwrap()).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn garbage_bytes_rejected() {
        assert!(TransportableSpec::from_bytes(&[0xff; 3]).is_err());
    }

    #[test]
    fn accessors_on_transportable() {
        let spec: ActionExecutionSpec<()> = transportable().into();
        assert_eq!(spec.display_name(), "render docs");
        assert_eq!(spec.implementation_identity(), "app::Render");
        assert!(spec.class_loader_structure().is_none());
        assert_eq!(spec.shape(), "transportable");
    }
}
