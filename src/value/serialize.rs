//! `serde` support for data-only values.

use serde::ser::{Error as _, Serialize, Serializer};

use super::Value;

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Int(number) => serializer.serialize_i64(*number),
            Self::Float(number) => serializer.serialize_f64(*number),
            Self::Str(text) => serializer.serialize_str(text),
            Self::Bytes(bytes) => serializer.serialize_bytes(bytes),
            Self::Array(items) => serializer.collect_seq(items),
            Self::Set(set) => serializer.collect_seq(set.iter()),
            Self::Map(map) => serializer.collect_map(map.iter()),
            Self::Object(object) => serializer.collect_map(object.iter()),
            Self::Function(_) | Self::Iter(_) | Self::Stream(_) | Self::Foreign(_) => Err(
                S::Error::custom(format_args!("cannot serialize a value of shape {}", self.shape())),
            ),
        }
    }
}
