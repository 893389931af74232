//! Faults raised while isolating, transporting or running a unit of work.

use std::fmt;

/// Direction of a serialization fault.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SerializationPhase {
    /// Snapshotting or writing parameters.
    Encode,
    /// Reading or materializing parameters.
    Decode,
}

impl fmt::Display for SerializationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationPhase::Encode => write!(f, "serialize"),
            SerializationPhase::Decode => write!(f, "deserialize"),
        }
    }
}

/// Faults that abort a unit of work.
///
/// None of these are recoverable for the affected unit: a unit is never
/// executed with parameters that failed to round-trip.
#[derive(Debug, thiserror::Error)]
pub enum WorkError {
    /// Parameters could not be encoded or decoded.
    #[error("could not {phase} unit of work{}: parameters of type `{type_name}`: {reason}", unit_suffix(.unit))]
    Serialization {
        /// The unit of work, when known.
        unit: Option<String>,
        /// Whether encoding or decoding failed.
        phase: SerializationPhase,
        /// The parameter type that was being processed.
        type_name: String,
        /// What went wrong.
        reason: String,
    },

    /// The implementation identity is unknown in the active context.
    #[error("could not deserialize unit of work '{unit}': cannot resolve implementation `{identity}` in {context}: {reason}")]
    Resolution {
        /// The unit of work.
        unit: String,
        /// The identity that was looked up.
        identity: String,
        /// The code-loading context that was searched.
        context: String,
        /// Why the lookup failed.
        reason: String,
    },

    /// A conversion was handed a spec in a shape it does not accept.
    #[error("cannot create a {conversion} spec from a spec in {shape} form")]
    UnsupportedShape {
        /// The requested target form.
        conversion: &'static str,
        /// The form of the spec that was passed in.
        shape: &'static str,
    },

    /// The execution context crossing the isolation boundary did not report
    /// a result.
    #[error("unit of work '{unit}' did not complete: {reason}")]
    DidNotComplete {
        /// The unit of work.
        unit: String,
        /// What happened to the execution context.
        reason: String,
    },

    /// The action ran and reported failure.
    #[error("unit of work '{unit}' failed: {reason}")]
    ActionFailed {
        /// The unit of work.
        unit: String,
        /// The failure reported by the action.
        reason: String,
    },
}

fn unit_suffix(unit: &Option<String>) -> String {
    unit.as_ref()
        .map(|u| format!(" '{u}'"))
        .unwrap_or_default()
}

impl WorkError {
    /// Attaches the unit of work to a serialization fault that lacks one.
    pub fn in_unit(self, name: &str) -> Self {
        match self {
            WorkError::Serialization {
                unit: None,
                phase,
                type_name,
                reason,
            } => WorkError::Serialization {
                unit: Some(name.to_string()),
                phase,
                type_name,
                reason,
            },
            other => other,
        }
    }

    pub(crate) fn encode(type_name: &str, reason: impl fmt::Display) -> Self {
        WorkError::Serialization {
            unit: None,
            phase: SerializationPhase::Encode,
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(type_name: &str, reason: impl fmt::Display) -> Self {
        WorkError::Serialization {
            unit: None,
            phase: SerializationPhase::Decode,
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_display_names_phase_and_type() {
        let err = WorkError::decode("app::Params", "unexpected end of input");
        let msg = err.to_string();
        assert!(msg.starts_with("could not deserialize unit of work:"));
        assert!(msg.contains("`app::Params`"));
        assert!(msg.contains("unexpected end of input"));
    }

    #[test]
    fn in_unit_names_the_unit() {
        let msg = WorkError::encode("app::Params", "bad key")
            .in_unit("compile docs")
            .to_string();
        assert!(msg.starts_with("could not serialize unit of work 'compile docs':"));
    }

    #[test]
    fn in_unit_keeps_existing_unit() {
        let err = WorkError::ActionFailed {
            unit: "a".to_string(),
            reason: "r".to_string(),
        }
        .in_unit("b");
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn resolution_display_names_identity_and_context() {
        let err = WorkError::Resolution {
            unit: "render".to_string(),
            identity: "app::RenderAction".to_string(),
            context: "worker registry 'isolated'".to_string(),
            reason: "not registered".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("could not deserialize unit of work"));
        assert!(msg.contains("app::RenderAction"));
        assert!(msg.contains("worker registry 'isolated'"));
    }

    #[test]
    fn unsupported_shape_display() {
        let err = WorkError::UnsupportedShape {
            conversion: "transportable",
            shape: "simple",
        };
        assert_eq!(
            err.to_string(),
            "cannot create a transportable spec from a spec in simple form"
        );
    }
}
