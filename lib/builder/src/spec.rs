use serde::Deserialize;
use serde_json::Value;

fn default_args() -> Value {
	Value::Object(serde_json::Map::new())
}

/// One node in a declarative graph description.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
	/// Unique (within this description) human label for the node.
	pub name: String,

	/// A type name registered in the `Registry`.
	#[serde(rename = "type")]
	pub type_name: String,

	/// Constructor arguments, forwarded verbatim to the registered
	/// builder. Extra keys are ignored by well-behaved builders; missing
	/// required keys surface as a construction failure.
	#[serde(default = "default_args")]
	pub args: Value,

	/// Names of downstream nodes this node feeds into. A name with no
	/// corresponding node in this description is logged and dropped.
	#[serde(default)]
	pub to: Vec<String>,
}

/// The top-level shape of a job description, as sent by the coordinator.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphSpec {
	pub nodes: Vec<NodeSpec>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_minimal_json() {
		let json = r#"{"nodes":[{"name":"s","type":"ConstSource"},{"name":"d","type":"DebugSink"}]}"#;
		let spec: GraphSpec = serde_json::from_str(json).unwrap();
		assert_eq!(spec.nodes.len(), 2);
		assert_eq!(spec.nodes[0].args, Value::Object(serde_json::Map::new()));
		assert!(spec.nodes[0].to.is_empty());
	}

	#[test]
	fn parses_edges_and_args() {
		let json = r#"{"nodes":[
			{"name":"s","type":"ConstSource","args":{"const":{"v":1},"interval":1},"to":["d"]},
			{"name":"d","type":"DebugSink"}
		]}"#;
		let spec: GraphSpec = serde_json::from_str(json).unwrap();
		assert_eq!(spec.nodes[0].to, vec!["d".to_string()]);
		assert_eq!(spec.nodes[0].args["interval"], 1);
	}
}
