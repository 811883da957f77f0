use std::sync::{Arc, Mutex};

use futures::future::join_all;
use tracing::warn;

use crate::{
	envelope::{stamp, AgentContext, Envelope},
	errors::NodeError,
	node::Node,
};

/// Shared state backing every source-capable node: the set of downstream
/// sinks and the agent context used to stamp outgoing envelopes.
///
/// Concrete node types hold a `SourceBase` as a field and delegate
/// `connect`, `next_nodes`, and emission to it.
pub struct SourceBase {
	agent: Arc<AgentContext>,
	downstream: Mutex<Vec<Arc<dyn Node>>>,
}

impl SourceBase {
	pub fn new(agent: Arc<AgentContext>) -> Self {
		Self {
			agent,
			downstream: Mutex::new(Vec::new()),
		}
	}

	/// Connect a downstream sink-capable node. The same sink may be
	/// connected to multiple sources, and a source may fan out to many
	/// sinks.
	pub fn connect(&self, sink: Arc<dyn Node>) -> Result<(), NodeError> {
		if !sink.is_sink_capable() {
			return Err(NodeError::TypeMismatch);
		}
		self.downstream.lock().unwrap_or_else(|e| e.into_inner()).push(sink);
		Ok(())
	}

	pub fn next_nodes(&self) -> Vec<Arc<dyn Node>> {
		self.downstream.lock().unwrap_or_else(|e| e.into_inner()).clone()
	}

	/// Stamp `envelope` (if it has no `meta` yet) and concurrently deliver
	/// it to every downstream sink. A no-op if there are no downstream
	/// sinks. Write failures are logged, not propagated: a slow or
	/// crashed sink must not take down the whole fan-out.
	pub async fn emit(&self, mut envelope: Envelope) {
		stamp(&mut envelope, &self.agent);

		let downstream = self.downstream.lock().unwrap_or_else(|e| e.into_inner()).clone();
		if downstream.is_empty() {
			return;
		}

		let writes = downstream
			.iter()
			.map(|sink| sink.write(envelope.clone()));

		for (sink, result) in downstream.iter().zip(join_all(writes).await) {
			if let Err(err) = result {
				warn!(sink = sink.name(), error = %err, "failed to deliver envelope to sink");
			}
		}
	}
}
