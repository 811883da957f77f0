use std::sync::Arc;

use async_trait::async_trait;
use seot_node::{AgentContext, Node, NodeError, NodeRuntimeError, SourceBase, TaskHandle};
use seot_registry::NodeBuilder;
use serde_json::Value;

/// A source that never emits. Useful for building graphs whose driving
/// behavior lives elsewhere, or for exercising lifecycle semantics in
/// isolation.
pub struct NullSource {
	name: String,
	source: SourceBase,
	task: TaskHandle,
}

impl NullSource {
	pub fn new(name: &str, agent: Arc<AgentContext>) -> Self {
		Self {
			name: name.to_string(),
			source: SourceBase::new(agent),
			task: TaskHandle::new(),
		}
	}
}

#[async_trait]
impl Node for NullSource {
	fn name(&self) -> &str {
		&self.name
	}

	fn type_name(&self) -> &str {
		"NullSource"
	}

	fn running(&self) -> bool {
		self.task.running()
	}

	async fn start(&self) -> Result<(), NodeError> {
		let cancel = self.task.cancellation_token();
		self.task.spawn(async move {
			cancel.cancelled().await;
			Ok(())
		})
	}

	async fn stop(&self) -> Result<(), NodeError> {
		self.task.request_stop()
	}

	async fn join(&self) -> Result<(), NodeRuntimeError> {
		self.task.join().await
	}

	fn next_nodes(&self) -> Vec<Arc<dyn Node>> {
		self.source.next_nodes()
	}

	fn connect(&self, sink: Arc<dyn Node>) -> Result<(), NodeError> {
		self.source.connect(sink)
	}
}

pub struct NullSourceBuilder;

impl NodeBuilder for NullSourceBuilder {
	fn type_name(&self) -> &str {
		"NullSource"
	}

	fn can_run(&self) -> bool {
		true
	}

	fn build(
		&self,
		name: &str,
		_args: &Value,
		ctx: &Arc<AgentContext>,
	) -> anyhow::Result<Arc<dyn Node>> {
		Ok(Arc::new(NullSource::new(name, ctx.clone())))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ctx() -> Arc<AgentContext> {
		Arc::new(AgentContext {
			agent_id: uuid::Uuid::nil(),
			longitude: 0.0,
			latitude: 0.0,
		})
	}

	#[tokio::test]
	async fn never_completes_until_stopped() {
		let node = NullSource::new("s", ctx());
		node.start().await.unwrap();
		assert!(node.running());
		node.stop().await.unwrap();
		node.join().await.unwrap();
		assert!(!node.running());
	}
}
