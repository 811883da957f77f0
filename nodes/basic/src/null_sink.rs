use std::sync::Arc;

use async_trait::async_trait;
use seot_node::{AgentContext, Envelope, Node, NodeError, NodeRuntimeError, SinkBase, TaskHandle};
use seot_registry::NodeBuilder;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
struct Args {
	qsize: Option<usize>,
}

/// A sink that silently drops every envelope it receives.
pub struct NullSink {
	name: String,
	sink: SinkBase,
	task: TaskHandle,
}

impl NullSink {
	pub fn new(name: &str, qsize: Option<usize>) -> Self {
		Self {
			name: name.to_string(),
			sink: SinkBase::new(qsize),
			task: TaskHandle::new(),
		}
	}
}

#[async_trait]
impl Node for NullSink {
	fn name(&self) -> &str {
		&self.name
	}

	fn type_name(&self) -> &str {
		"NullSink"
	}

	fn running(&self) -> bool {
		self.task.running()
	}

	async fn start(&self) -> Result<(), NodeError> {
		let cancel = self.task.cancellation_token();
		let rx = self.sink.take_receiver();

		self.task.spawn(async move {
			// `start()` is only reachable once per task generation (TaskHandle
			// rejects re-entry while running), so the receiver is still here.
			let mut rx = rx.unwrap();
			loop {
				tokio::select! {
					_ = cancel.cancelled() => break,
					next = rx.recv() => {
						if next.is_none() {
							break;
						}
					}
				}
			}
			Ok(())
		})
	}

	async fn stop(&self) -> Result<(), NodeError> {
		self.task.request_stop()
	}

	async fn join(&self) -> Result<(), NodeRuntimeError> {
		self.task.join().await
	}

	fn is_sink_capable(&self) -> bool {
		true
	}

	async fn write(&self, envelope: Envelope) -> Result<(), NodeRuntimeError> {
		self.sink.write(envelope).await
	}
}

pub struct NullSinkBuilder;

impl NodeBuilder for NullSinkBuilder {
	fn type_name(&self) -> &str {
		"NullSink"
	}

	fn can_run(&self) -> bool {
		true
	}

	fn build(
		&self,
		name: &str,
		args: &Value,
		_ctx: &Arc<AgentContext>,
	) -> anyhow::Result<Arc<dyn Node>> {
		let args: Args = serde_json::from_value(args.clone())?;
		Ok(Arc::new(NullSink::new(name, args.qsize)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn drops_everything_it_is_given() {
		let sink = NullSink::new("n", None);
		sink.start().await.unwrap();
		for _ in 0..10 {
			sink.write(Envelope::new()).await.unwrap();
		}
		sink.stop().await.unwrap();
		sink.join().await.unwrap();
	}
}
