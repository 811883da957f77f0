use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinError;

/// An error returned by a node's lifecycle methods (`start`, `stop`).
///
/// These are programmer errors: a well-behaved `Graph` never triggers them,
/// since it only calls `start` on ready nodes and `stop` on running ones.
#[derive(Debug, Clone, Error)]
pub enum NodeError {
	/// `start()` was called on a node that is already running.
	#[error("node is already running")]
	AlreadyRunning,

	/// `stop()` was called on a node that is not running.
	#[error("node is not running")]
	NotRunning,

	/// `connect()` was called with a node that is not sink-capable.
	#[error("cannot connect: target node does not accept input")]
	TypeMismatch,
}

/// An error raised by a node's long-running work task, or while acquiring
/// or releasing the external resources it depends on.
#[derive(Debug, Clone, Error)]
pub enum NodeRuntimeError {
	/// The work task panicked or was aborted without cooperating.
	#[error("node task did not terminate cleanly")]
	JoinError(#[from] Arc<JoinError>),

	/// This node does not implement the write capability (it is a pure
	/// source, or has not been connected to anything).
	#[error("node does not accept input")]
	NotASink,

	/// An error raised by the node implementation itself (I/O, a
	/// downstream service, a malformed parameter discovered at runtime).
	#[error("{0}")]
	Other(Arc<anyhow::Error>),
}

impl NodeRuntimeError {
	/// Wrap an arbitrary error as a node runtime error.
	pub fn other(err: impl Into<anyhow::Error>) -> Self {
		Self::Other(Arc::new(err.into()))
	}
}

impl From<JoinError> for NodeRuntimeError {
	fn from(value: JoinError) -> Self {
		Self::JoinError(Arc::new(value))
	}
}

/// An error raised by a node's `startup()`, surfaced by the `Graph` as part
/// of `GraphStartupFailed`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct NodeStartupError(#[from] pub anyhow::Error);
