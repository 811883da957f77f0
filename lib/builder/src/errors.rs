use std::sync::Arc;

use thiserror::Error;

/// A job description failed validation or materialization.
#[derive(Debug, Error, Clone)]
pub enum GraphSpecInvalid {
	/// The description could not be parsed as JSON or YAML.
	#[error("could not parse graph description: {0}")]
	Parse(String),

	/// The same node name appears more than once.
	#[error("duplicate node name `{0}`")]
	DuplicateName(String),

	/// `type` does not name a registered node type.
	#[error("node `{node}` has unregistered type `{type_name}`")]
	UnknownType { node: String, type_name: String },

	/// The registered builder failed to construct this node from its
	/// `args`.
	#[error("failed to construct node `{name}`: {cause}")]
	ConstructFailed { name: String, cause: Arc<anyhow::Error> },

	/// An edge's source is not source-capable, or its target is not
	/// sink-capable.
	#[error("edge `{from}` -> `{to}` connects incompatible node roles")]
	TypeMismatch { from: String, to: String },

	/// The description has no sources once every edge has been wired (or
	/// it has no nodes at all).
	#[error(transparent)]
	Graph(#[from] seot_graph::GraphError),
}
