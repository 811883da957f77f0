use std::sync::Arc;

use thiserror::Error;

/// An error encountered while constructing or running a [`crate::Graph`].
#[derive(Debug, Error, Clone)]
pub enum GraphError {
	/// A graph must be constructed from at least one source node.
	#[error("graph has no source nodes")]
	NoSources,

	/// The node set is not a DAG: some node is reachable from itself.
	#[error("graph contains a cycle")]
	ContainsCycle,

	/// A node's `startup()` failed; every node whose `startup()` had
	/// already completed was cleaned up on a best-effort basis.
	#[error("graph startup failed: {cause}")]
	StartupFailed { cause: Arc<anyhow::Error> },
}
