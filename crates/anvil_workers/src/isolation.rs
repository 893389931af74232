//! Deep snapshots of work parameters.
//!
//! An [`Isolatable`] owns a self-describing value tree captured from the
//! parameters at isolation time. Later mutation of the original value has no
//! effect on the snapshot, and the tree can be materialized into a fresh,
//! independent instance as many times as needed.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::WorkError;
use crate::value::IsolatedValue;

/// An isolated snapshot of a value of type `T`.
pub struct Isolatable<T> {
    type_name: String,
    value: IsolatedValue,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Isolatable<T> {
    pub(crate) fn from_parts(type_name: String, value: IsolatedValue) -> Self {
        Self {
            type_name,
            value,
            _marker: PhantomData,
        }
    }

    /// Returns the name of the type the snapshot was taken from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the captured value tree.
    pub fn value(&self) -> &IsolatedValue {
        &self.value
    }
}

impl<T: DeserializeOwned> Isolatable<T> {
    /// Builds a fresh instance of `T` from the snapshot.
    ///
    /// Each call returns a new value sharing nothing with the original or
    /// with previous materializations.
    pub fn materialize(&self) -> Result<T, WorkError> {
        T::deserialize(self.value.clone()).map_err(|e| WorkError::decode(&self.type_name, e))
    }
}

impl<T> Clone for Isolatable<T> {
    fn clone(&self) -> Self {
        Self::from_parts(self.type_name.clone(), self.value.clone())
    }
}

impl<T> PartialEq for Isolatable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.value == other.value
    }
}

impl<T> fmt::Debug for Isolatable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Isolatable")
            .field("type_name", &self.type_name)
            .field("value", &self.value)
            .finish()
    }
}

/// Takes deep snapshots of parameter values.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsolatableFactory;

impl IsolatableFactory {
    /// Creates a factory.
    pub fn new() -> Self {
        Self
    }

    /// Captures `value` into an independent snapshot.
    ///
    /// Fails with an encode-phase serialization fault if the value refuses to
    /// serialize or holds an integer wider than 64 bits.
    pub fn isolate<T: Serialize>(&self, value: &T) -> Result<Isolatable<T>, WorkError> {
        let type_name = std::any::type_name::<T>();
        let value =
            IsolatedValue::from_serialize(value).map_err(|e| WorkError::encode(type_name, e))?;
        Ok(Isolatable::from_parts(type_name.to_string(), value))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::*;
    use crate::error::SerializationPhase;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Options {
        name: String,
        flags: Vec<String>,
        level: u8,
        ratio: f64,
        limit: Option<u64>,
    }

    fn options() -> Options {
        Options {
            name: "docs".to_string(),
            flags: vec!["-g".to_string(), "-O".to_string()],
            level: 3,
            ratio: 0.5,
            limit: Some(u64::MAX),
        }
    }

    #[test]
    fn materialize_reproduces_value() {
        let snap = IsolatableFactory::new().isolate(&options()).unwrap();
        assert_eq!(snap.materialize().unwrap(), options());
    }

    #[test]
    fn snapshot_ignores_later_mutation() {
        let mut original = options();
        let snap = IsolatableFactory::new().isolate(&original).unwrap();
        original.flags.push("-Werror".to_string());
        original.name.clear();
        assert_eq!(snap.materialize().unwrap(), options());
    }

    #[test]
    fn materializations_are_independent() {
        let snap = IsolatableFactory::new().isolate(&options()).unwrap();
        let mut first = snap.materialize().unwrap();
        first.flags.clear();
        assert_eq!(snap.materialize().unwrap().flags.len(), 2);
    }

    #[test]
    fn records_keep_field_order() {
        let snap = IsolatableFactory::new().isolate(&options()).unwrap();
        let IsolatedValue::Map(fields) = snap.value() else {
            panic!("expected a record, got {:?}", snap.value());
        };
        let names: Vec<_> = fields
            .iter()
            .map(|(k, _)| match k {
                IsolatedValue::String(name) => name.as_str(),
                other => panic!("record key {other:?}"),
            })
            .collect();
        assert_eq!(names, ["name", "flags", "level", "ratio", "limit"]);
    }

    #[test]
    fn large_unsigned_kept_exact() {
        let snap = IsolatableFactory::new().isolate(&u64::MAX).unwrap();
        assert_eq!(snap.value(), &IsolatedValue::U64(u64::MAX));
        assert_eq!(snap.materialize().unwrap(), u64::MAX);
    }

    #[test]
    fn whole_floats_stay_floats() {
        let snap = IsolatableFactory::new().isolate(&2.0f64).unwrap();
        assert_eq!(snap.value(), &IsolatedValue::F64(2.0));
    }

    #[test]
    fn non_finite_ratio_survives() {
        let mut original = options();
        original.ratio = f64::NEG_INFINITY;
        original.limit = None;
        let snap = IsolatableFactory::new().isolate(&original).unwrap();
        assert_eq!(snap.materialize().unwrap(), original);

        original.ratio = f64::NAN;
        let snap = IsolatableFactory::new().isolate(&original).unwrap();
        assert!(snap.materialize().unwrap().ratio.is_nan());
    }

    #[test]
    fn present_empty_option_differs_from_absent() {
        let present = IsolatableFactory::new().isolate(&Some(None::<u8>)).unwrap();
        let absent = IsolatableFactory::new().isolate(&None::<Option<u8>>).unwrap();
        assert_ne!(present, absent);
        assert_eq!(present.materialize().unwrap(), Some(None));
        assert_eq!(absent.materialize().unwrap(), None);
    }

    #[test]
    fn nested_maps_round_trip() {
        let mut inner = BTreeMap::new();
        inner.insert("a".to_string(), vec![1i32, 2]);
        let mut outer = HashMap::new();
        outer.insert("k".to_string(), inner);
        let snap = IsolatableFactory::new().isolate(&outer).unwrap();
        assert_eq!(snap.materialize().unwrap(), outer);
    }

    #[test]
    fn type_name_recorded() {
        let snap = IsolatableFactory::new().isolate(&options()).unwrap();
        assert!(snap.type_name().ends_with("Options"));
    }

    struct Refuses;

    impl Serialize for Refuses {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("handle is not serializable"))
        }
    }

    #[test]
    fn refusing_value_is_encode_fault() {
        let err = IsolatableFactory::new().isolate(&vec![Refuses]).unwrap_err();
        assert!(matches!(
            err,
            WorkError::Serialization {
                phase: SerializationPhase::Encode,
                ..
            }
        ));
        assert!(err.to_string().contains("handle is not serializable"), "{err}");
    }

    #[test]
    fn record_keyed_map_round_trips() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1u8);
        let snap = IsolatableFactory::new().isolate(&map).unwrap();
        assert_eq!(snap.materialize().unwrap(), map);
    }

    #[test]
    fn materialize_into_wrong_shape_is_decode_fault() {
        let snap = IsolatableFactory::new().isolate(&"text").unwrap();
        let snap: Isolatable<u32> = Isolatable::from_parts(snap.type_name, snap.value);
        let err = snap.materialize().unwrap_err();
        assert!(matches!(
            err,
            WorkError::Serialization {
                phase: SerializationPhase::Decode,
                ..
            }
        ));
    }
}
