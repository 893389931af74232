//! Conversions between the forms of a unit of work.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::action::Implementation;
use crate::classloader::ClassLoaderStructure;
use crate::codec::IsolatableSerializerRegistry;
use crate::error::WorkError;
use crate::isolation::IsolatableFactory;
use crate::registry::ImplementationRegistry;
use crate::spec::{ActionExecutionSpec, IsolatedSpec, SimpleSpec, TransportableSpec};

/// Builds isolated specs and converts specs between their forms.
///
/// | input         | `to_transportable` | `to_simple`                  |
/// |---------------|--------------------|------------------------------|
/// | isolated      | encode parameters  | materialize parameters       |
/// | transportable | returned unchanged | decode, then resolve by name |
/// | simple        | unsupported        | unsupported                  |
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionExecutionSpecFactory {
    isolatables: IsolatableFactory,
    serializers: IsolatableSerializerRegistry,
}

impl ActionExecutionSpecFactory {
    /// Creates a factory with the default snapshot and codec components.
    pub fn new(isolatables: IsolatableFactory, serializers: IsolatableSerializerRegistry) -> Self {
        Self {
            isolatables,
            serializers,
        }
    }

    /// Describes a fresh unit of work, snapshotting `parameters`.
    ///
    /// Later changes to `parameters` do not affect the returned spec.
    pub fn new_isolated_spec<P: Serialize>(
        &self,
        display_name: impl Into<String>,
        implementation: Implementation<P>,
        parameters: &P,
        class_loader_structure: Option<ClassLoaderStructure>,
    ) -> Result<ActionExecutionSpec<P>, WorkError> {
        let display_name = display_name.into();
        let parameters = self
            .isolatables
            .isolate(parameters)
            .map_err(|e| e.in_unit(&display_name))?;
        Ok(ActionExecutionSpec::Isolated(IsolatedSpec {
            display_name,
            implementation,
            parameters,
            class_loader_structure,
        }))
    }

    /// Reduces a spec to plain data that may cross an isolation boundary.
    pub fn to_transportable<P>(
        &self,
        spec: ActionExecutionSpec<P>,
    ) -> Result<TransportableSpec, WorkError> {
        match spec {
            ActionExecutionSpec::Isolated(spec) => {
                let serialized_parameters = self
                    .serializers
                    .write_isolatable(&spec.parameters)
                    .map_err(|e| e.in_unit(&spec.display_name))?;
                tracing::debug!(
                    unit = %spec.display_name,
                    bytes = serialized_parameters.len(),
                    "encoded unit of work"
                );
                Ok(TransportableSpec {
                    implementation_identity: spec.implementation.identity().to_string(),
                    display_name: spec.display_name,
                    serialized_parameters,
                    class_loader_structure: spec.class_loader_structure,
                })
            }
            ActionExecutionSpec::Transportable(spec) => Ok(spec),
            ActionExecutionSpec::Simple(_) => Err(WorkError::UnsupportedShape {
                conversion: "transportable",
                shape: "simple",
            }),
        }
    }

    /// Produces a spec ready to run in the current context.
    ///
    /// Transportable specs are decoded and their implementation resolved in
    /// `context`.
    pub fn to_simple<P: DeserializeOwned + 'static>(
        &self,
        spec: ActionExecutionSpec<P>,
        context: &ImplementationRegistry,
    ) -> Result<SimpleSpec<P>, WorkError> {
        match spec {
            ActionExecutionSpec::Isolated(spec) => {
                let parameters = spec
                    .parameters
                    .materialize()
                    .map_err(|e| e.in_unit(&spec.display_name))?;
                Ok(SimpleSpec {
                    display_name: spec.display_name,
                    implementation: spec.implementation,
                    parameters,
                    class_loader_structure: spec.class_loader_structure,
                })
            }
            ActionExecutionSpec::Transportable(spec) => {
                let implementation = context
                    .resolve::<P>(&spec.display_name, &spec.implementation_identity)?;
                let parameters = self
                    .serializers
                    .read_isolatable::<P>(&spec.serialized_parameters)
                    .and_then(|isolated| isolated.materialize())
                    .map_err(|e| e.in_unit(&spec.display_name))?;
                Ok(SimpleSpec {
                    display_name: spec.display_name,
                    implementation,
                    parameters,
                    class_loader_structure: spec.class_loader_structure,
                })
            }
            ActionExecutionSpec::Simple(_) => Err(WorkError::UnsupportedShape {
                conversion: "simple",
                shape: "simple",
            }),
        }
    }
}
