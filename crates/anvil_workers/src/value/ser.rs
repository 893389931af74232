use serde::ser::{self, Serialize, Serializer};

use super::{IsolatedValue, ValueError};

/// Serializer producing an [`IsolatedValue`] tree.
pub(crate) struct ValueSerializer;

fn variant(name: &'static str, value: IsolatedValue) -> IsolatedValue {
    IsolatedValue::Variant {
        name: name.to_owned(),
        value: Box::new(value),
    }
}

impl Serializer for ValueSerializer {
    type Ok = IsolatedValue;
    type Error = ValueError;
    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = SeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = MapBuilder;

    fn serialize_bool(self, v: bool) -> Result<IsolatedValue, ValueError> {
        Ok(IsolatedValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<IsolatedValue, ValueError> {
        self.serialize_i64(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<IsolatedValue, ValueError> {
        self.serialize_i64(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<IsolatedValue, ValueError> {
        self.serialize_i64(v.into())
    }

    fn serialize_i64(self, v: i64) -> Result<IsolatedValue, ValueError> {
        Ok(IsolatedValue::I64(v))
    }

    fn serialize_i128(self, v: i128) -> Result<IsolatedValue, ValueError> {
        if let Ok(i) = i64::try_from(v) {
            Ok(IsolatedValue::I64(i))
        } else if let Ok(u) = u64::try_from(v) {
            Ok(IsolatedValue::U64(u))
        } else {
            Err(ValueError::new(format!("integer {v} does not fit in 64 bits")))
        }
    }

    fn serialize_u8(self, v: u8) -> Result<IsolatedValue, ValueError> {
        self.serialize_u64(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<IsolatedValue, ValueError> {
        self.serialize_u64(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<IsolatedValue, ValueError> {
        self.serialize_u64(v.into())
    }

    fn serialize_u64(self, v: u64) -> Result<IsolatedValue, ValueError> {
        Ok(IsolatedValue::U64(v))
    }

    fn serialize_u128(self, v: u128) -> Result<IsolatedValue, ValueError> {
        u64::try_from(v)
            .map(IsolatedValue::U64)
            .map_err(|_| ValueError::new(format!("integer {v} does not fit in 64 bits")))
    }

    fn serialize_f32(self, v: f32) -> Result<IsolatedValue, ValueError> {
        self.serialize_f64(v.into())
    }

    fn serialize_f64(self, v: f64) -> Result<IsolatedValue, ValueError> {
        Ok(IsolatedValue::F64(v))
    }

    fn serialize_char(self, v: char) -> Result<IsolatedValue, ValueError> {
        Ok(IsolatedValue::Char(v))
    }

    fn serialize_str(self, v: &str) -> Result<IsolatedValue, ValueError> {
        Ok(IsolatedValue::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<IsolatedValue, ValueError> {
        Ok(IsolatedValue::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<IsolatedValue, ValueError> {
        Ok(IsolatedValue::None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<IsolatedValue, ValueError>
    where
        T: ?Sized + Serialize,
    {
        Ok(IsolatedValue::Some(Box::new(value.serialize(self)?)))
    }

    fn serialize_unit(self) -> Result<IsolatedValue, ValueError> {
        Ok(IsolatedValue::Unit)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<IsolatedValue, ValueError> {
        Ok(IsolatedValue::Unit)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        name: &'static str,
    ) -> Result<IsolatedValue, ValueError> {
        Ok(variant(name, IsolatedValue::Unit))
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<IsolatedValue, ValueError>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _index: u32,
        name: &'static str,
        value: &T,
    ) -> Result<IsolatedValue, ValueError>
    where
        T: ?Sized + Serialize,
    {
        Ok(variant(name, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, ValueError> {
        Ok(SeqBuilder::new(None, len))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, ValueError> {
        Ok(SeqBuilder::new(None, Some(len)))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, ValueError> {
        Ok(SeqBuilder::new(None, Some(len)))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, ValueError> {
        Ok(SeqBuilder::new(Some(name), Some(len)))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, ValueError> {
        Ok(MapBuilder::new(None, len))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapBuilder, ValueError> {
        Ok(MapBuilder::new(None, Some(len)))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        name: &'static str,
        len: usize,
    ) -> Result<MapBuilder, ValueError> {
        Ok(MapBuilder::new(Some(name), Some(len)))
    }
}

/// Collects the elements of a sequence, tuple or tuple variant.
pub(crate) struct SeqBuilder {
    variant: Option<&'static str>,
    items: Vec<IsolatedValue>,
}

impl SeqBuilder {
    fn new(variant: Option<&'static str>, len: Option<usize>) -> Self {
        Self {
            variant,
            items: Vec::with_capacity(len.unwrap_or(0)),
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ValueError> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn finish(self) -> IsolatedValue {
        let seq = IsolatedValue::Seq(self.items);
        match self.variant {
            Some(name) => variant(name, seq),
            None => seq,
        }
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = IsolatedValue;
    type Error = ValueError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<IsolatedValue, ValueError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = IsolatedValue;
    type Error = ValueError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<IsolatedValue, ValueError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = IsolatedValue;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<IsolatedValue, ValueError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SeqBuilder {
    type Ok = IsolatedValue;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<IsolatedValue, ValueError> {
        Ok(self.finish())
    }
}

/// Collects the entries of a map, record or struct variant in order.
pub(crate) struct MapBuilder {
    variant: Option<&'static str>,
    entries: Vec<(IsolatedValue, IsolatedValue)>,
    pending_key: Option<IsolatedValue>,
}

impl MapBuilder {
    fn new(variant: Option<&'static str>, len: Option<usize>) -> Self {
        Self {
            variant,
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        }
    }

    fn field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ValueError> {
        let value = value.serialize(ValueSerializer)?;
        self.entries
            .push((IsolatedValue::String(key.to_owned()), value));
        Ok(())
    }

    fn finish(self) -> IsolatedValue {
        let map = IsolatedValue::Map(self.entries);
        match self.variant {
            Some(name) => variant(name, map),
            None => map,
        }
    }
}

impl ser::SerializeMap for MapBuilder {
    type Ok = IsolatedValue;
    type Error = ValueError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(key.serialize(ValueSerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| ValueError::new("map value serialized before its key"))?;
        self.entries.push((key, value.serialize(ValueSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<IsolatedValue, ValueError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = IsolatedValue;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<IsolatedValue, ValueError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for MapBuilder {
    type Ok = IsolatedValue;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), ValueError>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<IsolatedValue, ValueError> {
        Ok(self.finish())
    }
}
