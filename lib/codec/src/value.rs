use std::{collections::BTreeMap, fmt};

use serde::{
	de::{self, MapAccess, SeqAccess, Visitor},
	ser::{SerializeMap, SerializeSeq},
	Deserialize, Deserializer, Serialize, Serializer,
};

/// A self-describing value as carried by the wire codec: the MessagePack
/// type lattice reduced to what inter-node transports need. Unlike
/// [`serde_json::Value`], `String` and `Bytes` are distinct variants,
/// matching the distinction MessagePack itself makes between `str` and
/// `bin`.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	Bytes(Vec<u8>),
	List(Vec<WireValue>),
	Map(BTreeMap<String, WireValue>),
}

impl Serialize for WireValue {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			WireValue::Null => serializer.serialize_unit(),
			WireValue::Bool(b) => serializer.serialize_bool(*b),
			WireValue::Int(i) => serializer.serialize_i64(*i),
			WireValue::Float(f) => serializer.serialize_f64(*f),
			WireValue::String(s) => serializer.serialize_str(s),
			WireValue::Bytes(b) => serializer.serialize_bytes(b),
			WireValue::List(items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;
				for item in items {
					seq.serialize_element(item)?;
				}
				seq.end()
			}
			WireValue::Map(entries) => {
				let mut map = serializer.serialize_map(Some(entries.len()))?;
				for (k, v) in entries {
					map.serialize_entry(k, v)?;
				}
				map.end()
			}
		}
	}
}

struct WireValueVisitor;

impl<'de> Visitor<'de> for WireValueVisitor {
	type Value = WireValue;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("a value representable by the wire codec")
	}

	fn visit_unit<E>(self) -> Result<Self::Value, E> {
		Ok(WireValue::Null)
	}

	fn visit_none<E>(self) -> Result<Self::Value, E> {
		Ok(WireValue::Null)
	}

	fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
		Ok(WireValue::Bool(v))
	}

	fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
		Ok(WireValue::Int(v))
	}

	fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
	where
		E: de::Error,
	{
		i64::try_from(v)
			.map(WireValue::Int)
			.map_err(|_| de::Error::custom("integer out of i64 range"))
	}

	fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
		Ok(WireValue::Float(v))
	}

	fn visit_f32<E>(self, v: f32) -> Result<Self::Value, E> {
		Ok(WireValue::Float(f64::from(v)))
	}

	fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
		Ok(WireValue::String(v.to_owned()))
	}

	fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
		Ok(WireValue::String(v))
	}

	fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E> {
		Ok(WireValue::Bytes(v.to_vec()))
	}

	fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E> {
		Ok(WireValue::Bytes(v))
	}

	fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
	where
		A: SeqAccess<'de>,
	{
		let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
		while let Some(item) = seq.next_element()? {
			items.push(item);
		}
		Ok(WireValue::List(items))
	}

	fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
	where
		A: MapAccess<'de>,
	{
		let mut entries = BTreeMap::new();
		while let Some((k, v)) = map.next_entry()? {
			entries.insert(k, v);
		}
		Ok(WireValue::Map(entries))
	}
}

impl<'de> Deserialize<'de> for WireValue {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_any(WireValueVisitor)
	}
}

impl From<serde_json::Value> for WireValue {
	fn from(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => WireValue::Null,
			serde_json::Value::Bool(b) => WireValue::Bool(b),
			serde_json::Value::Number(n) => match n.as_i64() {
				Some(i) => WireValue::Int(i),
				None => WireValue::Float(n.as_f64().unwrap_or_default()),
			},
			serde_json::Value::String(s) => WireValue::String(s),
			serde_json::Value::Array(items) => WireValue::List(items.into_iter().map(Into::into).collect()),
			serde_json::Value::Object(entries) => {
				WireValue::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
			}
		}
	}
}

/// A byte string was encountered where a JSON value was expected; JSON has
/// no native byte-string type.
#[derive(Debug, thiserror::Error)]
#[error("byte string has no JSON representation")]
pub struct NotJsonRepresentable;

impl TryFrom<WireValue> for serde_json::Value {
	type Error = NotJsonRepresentable;

	fn try_from(value: WireValue) -> Result<Self, Self::Error> {
		Ok(match value {
			WireValue::Null => serde_json::Value::Null,
			WireValue::Bool(b) => serde_json::Value::Bool(b),
			WireValue::Int(i) => serde_json::Value::Number(i.into()),
			WireValue::Float(f) => serde_json::Number::from_f64(f)
				.map(serde_json::Value::Number)
				.unwrap_or(serde_json::Value::Null),
			WireValue::String(s) => serde_json::Value::String(s),
			WireValue::Bytes(_) => return Err(NotJsonRepresentable),
			WireValue::List(items) => {
				let mut out = Vec::with_capacity(items.len());
				for item in items {
					out.push(serde_json::Value::try_from(item)?);
				}
				serde_json::Value::Array(out)
			}
			WireValue::Map(entries) => {
				let mut out = serde_json::Map::with_capacity(entries.len());
				for (k, v) in entries {
					out.insert(k, serde_json::Value::try_from(v)?);
				}
				serde_json::Value::Object(out)
			}
		})
	}
}
