use std::sync::Arc;

use async_trait::async_trait;

use crate::{
	envelope::Envelope,
	errors::{NodeError, NodeRuntimeError, NodeStartupError},
};

/// The capability interface every node in the dataflow graph satisfies.
///
/// `Source`, `Sink`, and `Transformer` are not separate traits: they are
/// roles a concrete node plays by composing [`crate::source::SourceBase`]
/// and/or [`crate::sink::SinkBase`] (and, for its work task's lifecycle,
/// [`crate::task::TaskHandle`]) and overriding the relevant default methods
/// below. This keeps the trait object-safe (`Arc<dyn Node>` is used
/// uniformly by the registry, builder, and graph) without a type hierarchy
/// to navigate.
#[async_trait]
pub trait Node: Send + Sync {
	/// Human label for this node instance; defaults to its type name.
	fn name(&self) -> &str;

	/// The registered type name this node was constructed from.
	fn type_name(&self) -> &str;

	/// `true` iff this node's work task exists and has not completed.
	fn running(&self) -> bool;

	/// Acquire external resources. Called at most once, before `start()`.
	async fn startup(&self) -> Result<(), NodeStartupError> {
		Ok(())
	}

	/// Launch this node's long-running work task. Non-blocking: the task
	/// runs independently of this call returning.
	async fn start(&self) -> Result<(), NodeError>;

	/// Request cooperative cancellation of the running work task.
	/// Non-blocking; callers await completion separately via [`Self::join`].
	async fn stop(&self) -> Result<(), NodeError>;

	/// Await this node's work task to completion (or cancellation). Safe
	/// to call concurrently from more than one caller (the graph's
	/// supervisor and a `stop()` caller both observe the same outcome).
	/// Resolves immediately, with `Ok(())`, if the task never ran.
	async fn join(&self) -> Result<(), NodeRuntimeError> {
		Ok(())
	}

	/// Release every resource acquired by `startup()`. Called at most once,
	/// after `stop()` (or after a failed `startup()`). Must not fail
	/// fatally; log-and-continue on secondary errors.
	async fn cleanup(&self) {}

	/// Ordered list of downstream nodes. Empty for pure sinks.
	fn next_nodes(&self) -> Vec<Arc<dyn Node>> {
		Vec::new()
	}

	/// Connect a downstream sink-capable node. Only meaningful for
	/// source-capable nodes; the default rejects every target.
	fn connect(&self, _sink: Arc<dyn Node>) -> Result<(), NodeError> {
		Err(NodeError::TypeMismatch)
	}

	/// `true` iff this node accepts input via `write()`.
	fn is_sink_capable(&self) -> bool {
		false
	}

	/// Enqueue one envelope for processing. Only meaningful for
	/// sink-capable nodes; the default rejects every call.
	async fn write(&self, _envelope: Envelope) -> Result<(), NodeRuntimeError> {
		Err(NodeRuntimeError::NotASink)
	}
}
