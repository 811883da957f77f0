use std::sync::Arc;

use async_trait::async_trait;
use seot_node::{
	AgentContext, Envelope, Node, NodeError, NodeRuntimeError, SinkBase, SourceBase, TaskHandle,
};
use seot_registry::NodeBuilder;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
struct Args {
	qsize: Option<usize>,
}

struct Inner {
	name: String,
	sink: SinkBase,
	source: SourceBase,
	task: TaskHandle,
}

/// A transformer that passes its input through unchanged. Demonstrates the
/// transformer role without adding semantics of its own.
pub struct IdentityTransformer {
	inner: Arc<Inner>,
}

impl IdentityTransformer {
	pub fn new(name: &str, agent: Arc<AgentContext>, qsize: Option<usize>) -> Self {
		Self {
			inner: Arc::new(Inner {
				name: name.to_string(),
				sink: SinkBase::new(qsize),
				source: SourceBase::new(agent),
				task: TaskHandle::new(),
			}),
		}
	}
}

#[async_trait]
impl Node for IdentityTransformer {
	fn name(&self) -> &str {
		&self.inner.name
	}

	fn type_name(&self) -> &str {
		"IdentityTransformer"
	}

	fn running(&self) -> bool {
		self.inner.task.running()
	}

	async fn start(&self) -> Result<(), NodeError> {
		let inner = self.inner.clone();
		let cancel = self.inner.task.cancellation_token();

		self.inner.task.spawn(async move {
			// `start()` is only reachable once per task generation (TaskHandle
			// rejects re-entry while running), so the receiver is still here.
			let mut rx = inner.sink.take_receiver().unwrap();

			loop {
				tokio::select! {
					_ = cancel.cancelled() => break,
					next = rx.recv() => {
						match next {
							Some(envelope) => inner.source.emit(envelope).await,
							None => break,
						}
					}
				}
			}

			inner.sink.return_receiver(rx);
			Ok(())
		})
	}

	async fn stop(&self) -> Result<(), NodeError> {
		self.inner.task.request_stop()
	}

	async fn join(&self) -> Result<(), NodeRuntimeError> {
		self.inner.task.join().await
	}

	fn next_nodes(&self) -> Vec<Arc<dyn Node>> {
		self.inner.source.next_nodes()
	}

	fn connect(&self, sink: Arc<dyn Node>) -> Result<(), NodeError> {
		self.inner.source.connect(sink)
	}

	fn is_sink_capable(&self) -> bool {
		true
	}

	async fn write(&self, envelope: Envelope) -> Result<(), NodeRuntimeError> {
		self.inner.sink.write(envelope).await
	}
}

pub struct IdentityTransformerBuilder;

impl NodeBuilder for IdentityTransformerBuilder {
	fn type_name(&self) -> &str {
		"IdentityTransformer"
	}

	fn can_run(&self) -> bool {
		true
	}

	fn build(
		&self,
		name: &str,
		args: &Value,
		ctx: &Arc<AgentContext>,
	) -> anyhow::Result<Arc<dyn Node>> {
		let args: Args = serde_json::from_value(args.clone())?;
		Ok(Arc::new(IdentityTransformer::new(name, ctx.clone(), args.qsize)))
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
	async fn forwards_input_to_downstream_sink() {
		use crate::null_sink::NullSink;

		let transformer = IdentityTransformer::new("t", ctx(), None);
		let sink = Arc::new(NullSink::new("out", None));
		transformer.connect(sink).unwrap();

		transformer.start().await.unwrap();
		let mut envelope = Envelope::new();
		envelope.insert("v".into(), serde_json::json!(1));
		transformer.write(envelope).await.unwrap();

		transformer.stop().await.unwrap();
		transformer.join().await.unwrap();
	}
}
