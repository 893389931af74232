//! Self-describing value trees for isolated parameters.
//!
//! [`IsolatedValue`] is produced by a serde serializer and read back through
//! its own serde deserializer, so every shape serde can express survives a
//! snapshot: non-finite floats, nested options, enums, and maps keyed by
//! arbitrary values.

mod de;
mod ser;

use std::fmt;

use serde::{Deserialize, Serialize};

pub(crate) use ser::ValueSerializer;

/// A self-describing parameter value.
///
/// Records keep their field order; sequences and maps nest to any depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IsolatedValue {
    /// The unit value, unit structs included.
    Unit,
    /// A boolean.
    Bool(bool),
    /// A signed integer of at most 64 bits.
    I64(i64),
    /// An unsigned integer of at most 64 bits.
    U64(u64),
    /// A floating point number; `f32` is widened.
    F64(f64),
    /// A single character.
    Char(char),
    /// A string.
    String(String),
    /// An opaque byte buffer.
    Bytes(Vec<u8>),
    /// An absent optional value.
    None,
    /// A present optional value.
    Some(Box<IsolatedValue>),
    /// A sequence, tuple or tuple struct.
    Seq(Vec<IsolatedValue>),
    /// A map or record. Record fields are keyed by their names.
    Map(Vec<(IsolatedValue, IsolatedValue)>),
    /// An enum variant. Unit variants carry [`IsolatedValue::Unit`].
    Variant {
        /// Variant name.
        name: String,
        /// Variant payload.
        value: Box<IsolatedValue>,
    },
}

impl IsolatedValue {
    /// Captures `value` as a value tree.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ValueError> {
        value.serialize(ValueSerializer)
    }

    fn unexpected(&self) -> serde::de::Unexpected<'_> {
        use serde::de::Unexpected;
        match self {
            IsolatedValue::Unit => Unexpected::Unit,
            IsolatedValue::Bool(b) => Unexpected::Bool(*b),
            IsolatedValue::I64(i) => Unexpected::Signed(*i),
            IsolatedValue::U64(u) => Unexpected::Unsigned(*u),
            IsolatedValue::F64(f) => Unexpected::Float(*f),
            IsolatedValue::Char(c) => Unexpected::Char(*c),
            IsolatedValue::String(s) => Unexpected::Str(s),
            IsolatedValue::Bytes(b) => Unexpected::Bytes(b),
            IsolatedValue::None | IsolatedValue::Some(_) => Unexpected::Option,
            IsolatedValue::Seq(_) => Unexpected::Seq,
            IsolatedValue::Map(_) => Unexpected::Map,
            IsolatedValue::Variant { .. } => Unexpected::Enum,
        }
    }
}

/// Failure to capture or rebuild a value tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValueError(String);

impl ValueError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl serde::ser::Error for ValueError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

impl serde::de::Error for ValueError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}
