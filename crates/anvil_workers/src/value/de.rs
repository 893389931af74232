use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, DeserializeSeed, Deserializer, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

use super::{IsolatedValue, ValueError};

fn visit_seq<'de, V: Visitor<'de>>(
    items: Vec<IsolatedValue>,
    visitor: V,
) -> Result<V::Value, ValueError> {
    SeqDeserializer::<_, ValueError>::new(items.into_iter()).deserialize_any(visitor)
}

fn visit_map<'de, V: Visitor<'de>>(
    entries: Vec<(IsolatedValue, IsolatedValue)>,
    visitor: V,
) -> Result<V::Value, ValueError> {
    MapDeserializer::<_, ValueError>::new(entries.into_iter()).deserialize_any(visitor)
}

impl<'de> IntoDeserializer<'de, ValueError> for IsolatedValue {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> Deserializer<'de> for IsolatedValue {
    type Error = ValueError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValueError> {
        match self {
            IsolatedValue::Unit => visitor.visit_unit(),
            IsolatedValue::Bool(b) => visitor.visit_bool(b),
            IsolatedValue::I64(i) => visitor.visit_i64(i),
            IsolatedValue::U64(u) => visitor.visit_u64(u),
            IsolatedValue::F64(f) => visitor.visit_f64(f),
            IsolatedValue::Char(c) => visitor.visit_char(c),
            IsolatedValue::String(s) => visitor.visit_string(s),
            IsolatedValue::Bytes(b) => visitor.visit_byte_buf(b),
            IsolatedValue::None => visitor.visit_none(),
            IsolatedValue::Some(inner) => visitor.visit_some(*inner),
            IsolatedValue::Seq(items) => visit_seq(items, visitor),
            IsolatedValue::Map(entries) => visit_map(entries, visitor),
            IsolatedValue::Variant { name, value } => match *value {
                IsolatedValue::Unit => visitor.visit_string(name),
                value => visit_map(vec![(IsolatedValue::String(name), value)], visitor),
            },
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValueError> {
        match self {
            IsolatedValue::None => visitor.visit_none(),
            IsolatedValue::Some(inner) => visitor.visit_some(*inner),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ValueError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ValueError> {
        let (name, value) = match self {
            IsolatedValue::Variant { name, value } => (name, *value),
            IsolatedValue::String(name) => (name, IsolatedValue::Unit),
            other => {
                return Err(de::Error::invalid_type(
                    other.unexpected(),
                    &"an enum variant",
                ))
            }
        };
        visitor.visit_enum(EnumAccessor { name, value })
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ValueError> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier
    }
}

struct EnumAccessor {
    name: String,
    value: IsolatedValue,
}

impl<'de> de::EnumAccess<'de> for EnumAccessor {
    type Error = ValueError;
    type Variant = VariantAccessor;

    fn variant_seed<S: DeserializeSeed<'de>>(
        self,
        seed: S,
    ) -> Result<(S::Value, VariantAccessor), ValueError> {
        let tag = seed.deserialize(IsolatedValue::String(self.name))?;
        Ok((tag, VariantAccessor { value: self.value }))
    }
}

struct VariantAccessor {
    value: IsolatedValue,
}

impl<'de> de::VariantAccess<'de> for VariantAccessor {
    type Error = ValueError;

    fn unit_variant(self) -> Result<(), ValueError> {
        match self.value {
            IsolatedValue::Unit => Ok(()),
            other => Err(de::Error::invalid_type(other.unexpected(), &"a unit variant")),
        }
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(
        self,
        seed: S,
    ) -> Result<S::Value, ValueError> {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, ValueError> {
        match self.value {
            IsolatedValue::Seq(items) => visit_seq(items, visitor),
            other => Err(de::Error::invalid_type(other.unexpected(), &"a tuple variant")),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ValueError> {
        match self.value {
            IsolatedValue::Map(entries) => visit_map(entries, visitor),
            other => Err(de::Error::invalid_type(other.unexpected(), &"a struct variant")),
        }
    }
}
