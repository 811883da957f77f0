//! A stateless, self-describing binary wire codec interoperable with
//! MessagePack, used by inter-node transports (the ZMQ PUSH/PULL and
//! container-socket transforms described alongside this crate).
//!
//! Unlike [`serde_json::Value`], [`WireValue`] distinguishes a UTF-8
//! string from an opaque byte string, matching what the wire format itself
//! distinguishes.

mod value;

use std::io::Cursor;

use bytes::{Buf, BytesMut};
use seot_node::Envelope;
use serde::Deserialize;
use thiserror::Error;

pub use value::{NotJsonRepresentable, WireValue};

/// Failure to encode or decode a wire message.
#[derive(Debug, Error)]
pub enum CodecError {
	#[error("failed to encode value: {0}")]
	Encode(#[from] rmp_serde::encode::Error),

	#[error("failed to decode value: {0}")]
	Decode(#[from] rmp_serde::decode::Error),

	#[error("decoded value cannot be represented as an envelope: {0}")]
	NotAnEnvelope(#[from] NotJsonRepresentable),
}

/// Encode `value` as one self-describing message.
pub fn encode(value: &WireValue) -> Result<Vec<u8>, CodecError> {
	Ok(rmp_serde::to_vec(value)?)
}

/// Decode one complete message. Fails if `bytes` holds anything other than
/// exactly one message's worth of data.
pub fn decode(bytes: &[u8]) -> Result<WireValue, CodecError> {
	Ok(rmp_serde::from_slice(bytes)?)
}

/// Encode an envelope for a container-socket or ZMQ transport.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
	let value: WireValue = serde_json::Value::Object(envelope.clone()).into();
	encode(&value)
}

/// Decode an envelope previously written by [`encode_envelope`].
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, CodecError> {
	let value = serde_json::Value::try_from(decode(bytes)?)?;
	match value {
		serde_json::Value::Object(map) => Ok(map),
		_ => Err(CodecError::NotAnEnvelope(NotJsonRepresentable)),
	}
}

/// Incremental framer for stream transports: bytes are fed as they
/// arrive, and complete messages are pulled out as soon as they're
/// available. A partial message is buffered across calls rather than
/// failing.
#[derive(Default)]
pub struct Framer {
	buf: BytesMut,
}

impl Framer {
	pub fn new() -> Self {
		Self { buf: BytesMut::new() }
	}

	/// Append newly-received bytes to the framer's internal buffer.
	pub fn feed(&mut self, bytes: &[u8]) {
		self.buf.extend_from_slice(bytes);
	}

	/// Pull the next complete message out of the buffer. Returns
	/// `Ok(None)` if the buffer holds only a partial message so far.
	pub fn next_message(&mut self) -> Result<Option<WireValue>, CodecError> {
		if self.buf.is_empty() {
			return Ok(None);
		}

		let mut cursor = Cursor::new(&self.buf[..]);
		match WireValue::deserialize(&mut rmp_serde::Deserializer::new(&mut cursor)) {
			Ok(value) => {
				let consumed = cursor.position() as usize;
				self.buf.advance(consumed);
				Ok(Some(value))
			}
			Err(err) if is_truncated(&err) => Ok(None),
			Err(err) => Err(CodecError::Decode(err)),
		}
	}
}

fn is_truncated(err: &rmp_serde::decode::Error) -> bool {
	use rmp_serde::decode::Error;
	matches!(
		err,
		Error::InvalidMarkerRead(e) | Error::InvalidDataRead(e)
			if e.kind() == std::io::ErrorKind::UnexpectedEof
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;

	fn roundtrip(value: WireValue) {
		let bytes = encode(&value).unwrap();
		assert_eq!(decode(&bytes).unwrap(), value);
	}

	#[test]
	fn roundtrips_null() {
		roundtrip(WireValue::Null);
	}

	#[test]
	fn roundtrips_bool() {
		roundtrip(WireValue::Bool(true));
		roundtrip(WireValue::Bool(false));
	}

	#[test]
	fn roundtrips_int64() {
		roundtrip(WireValue::Int(-1));
		roundtrip(WireValue::Int(i64::MIN));
		roundtrip(WireValue::Int(i64::MAX));
	}

	#[test]
	fn roundtrips_float64() {
		roundtrip(WireValue::Float(1.5));
		roundtrip(WireValue::Float(-0.0));
	}

	#[test]
	fn roundtrips_string() {
		roundtrip(WireValue::String("hello, agent".into()));
	}

	#[test]
	fn roundtrips_byte_string() {
		roundtrip(WireValue::Bytes(vec![0, 159, 146, 150]));
	}

	#[test]
	fn roundtrips_list() {
		roundtrip(WireValue::List(vec![
			WireValue::Int(1),
			WireValue::Int(2),
			WireValue::Int(3),
		]));
	}

	#[test]
	fn roundtrips_map_with_string_keys() {
		let mut map = BTreeMap::new();
		map.insert("agent_id".to_string(), WireValue::String("u".into()));
		map.insert("longitude".to_string(), WireValue::Float(1.5));
		roundtrip(WireValue::Map(map));
	}

	#[test]
	fn byte_string_is_distinct_from_string() {
		let bytes = WireValue::Bytes(vec![104, 105]);
		let string = WireValue::String("hi".into());
		assert_ne!(encode(&bytes).unwrap(), encode(&string).unwrap());
	}

	#[test]
	fn framer_yields_nothing_until_a_full_message_arrives() {
		let message = encode(&WireValue::Int(42)).unwrap();
		let mut framer = Framer::new();

		framer.feed(&message[..message.len() - 1]);
		assert!(framer.next_message().unwrap().is_none());

		framer.feed(&message[message.len() - 1..]);
		assert_eq!(framer.next_message().unwrap(), Some(WireValue::Int(42)));
	}

	#[test]
	fn framer_splits_back_to_back_messages() {
		let mut framer = Framer::new();
		let mut combined = encode(&WireValue::Int(1)).unwrap();
		combined.extend(encode(&WireValue::Int(2)).unwrap());
		framer.feed(&combined);

		assert_eq!(framer.next_message().unwrap(), Some(WireValue::Int(1)));
		assert_eq!(framer.next_message().unwrap(), Some(WireValue::Int(2)));
		assert_eq!(framer.next_message().unwrap(), None);
	}

	#[test]
	fn envelope_round_trip() {
		let mut envelope = Envelope::new();
		envelope.insert(
			"meta".into(),
			serde_json::json!({
				"agent_id": "u",
				"longitude": 1.5,
				"latitude": -2.0,
				"timestamp": 1_700_000_000,
			}),
		);
		envelope.insert("payload".into(), serde_json::json!([1, 2, 3]));

		let bytes = encode_envelope(&envelope).unwrap();
		assert_eq!(decode_envelope(&bytes).unwrap(), envelope);
	}
}
