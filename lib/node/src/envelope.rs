//! The message envelope that flows between nodes, and the identity stamp
//! every source attaches to it before emission.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A map-shaped message flowing between nodes.
///
/// Transformers pass envelopes through unchanged unless they choose to
/// rewrite them; sources attach a `meta` sub-map on first emission.
pub type Envelope = Map<String, Value>;

/// Identity and location metadata a source node attaches to an envelope
/// that does not already carry one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeMeta {
	pub agent_id: Uuid,
	pub longitude: f64,
	pub latitude: f64,
	pub timestamp: i64,
}

/// The slice of agent state a source needs in order to stamp an envelope:
/// identity and location. Held behind an `Arc` by every source node.
#[derive(Debug, Clone)]
pub struct AgentContext {
	pub agent_id: Uuid,
	pub longitude: f64,
	pub latitude: f64,
}

/// Stamp `envelope` with `meta` if it doesn't already have one.
///
/// Idempotent: an envelope that already carries `meta` (e.g. one relayed
/// from an upstream agent) is left untouched.
pub fn stamp(envelope: &mut Envelope, ctx: &AgentContext) {
	if envelope.contains_key("meta") {
		return;
	}

	let meta = EnvelopeMeta {
		agent_id: ctx.agent_id,
		longitude: ctx.longitude,
		latitude: ctx.latitude,
		timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
	};

	// `EnvelopeMeta` is a plain struct of primitives; this conversion
	// cannot fail.
	if let Ok(value) = serde_json::to_value(meta) {
		envelope.insert("meta".into(), value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ctx() -> AgentContext {
		AgentContext {
			agent_id: Uuid::nil(),
			longitude: 1.5,
			latitude: -2.0,
		}
	}

	#[test]
	fn stamps_unstamped_envelope() {
		let mut envelope = Envelope::new();
		envelope.insert("payload".into(), Value::from(1));
		stamp(&mut envelope, &ctx());

		let meta = envelope.get("meta").unwrap();
		assert_eq!(meta.get("agent_id").unwrap(), &Value::from(Uuid::nil().to_string()));
		assert_eq!(meta.get("longitude").unwrap(), &Value::from(1.5));
	}

	#[test]
	fn does_not_overwrite_existing_meta() {
		let mut envelope = Envelope::new();
		envelope.insert(
			"meta".into(),
			serde_json::json!({"agent_id": "upstream", "longitude": 0.0, "latitude": 0.0, "timestamp": 1}),
		);
		stamp(&mut envelope, &ctx());

		assert_eq!(envelope["meta"]["agent_id"], Value::from("upstream"));
	}
}
