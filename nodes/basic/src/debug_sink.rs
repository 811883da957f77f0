use std::sync::Arc;

use async_trait::async_trait;
use seot_node::{AgentContext, Envelope, Node, NodeError, NodeRuntimeError, SinkBase, TaskHandle};
use seot_registry::NodeBuilder;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Level {
	Trace,
	Debug,
	Info,
	Warn,
	Error,
}

impl Default for Level {
	fn default() -> Self {
		Level::Info
	}
}

fn log_envelope(level: Level, name: &str, envelope: &Envelope) {
	match level {
		Level::Trace => tracing::trace!(node = name, envelope = %serde_json::Value::Object(envelope.clone()), "envelope"),
		Level::Debug => tracing::debug!(node = name, envelope = %serde_json::Value::Object(envelope.clone()), "envelope"),
		Level::Info => tracing::info!(node = name, envelope = %serde_json::Value::Object(envelope.clone()), "envelope"),
		Level::Warn => tracing::warn!(node = name, envelope = %serde_json::Value::Object(envelope.clone()), "envelope"),
		Level::Error => tracing::error!(node = name, envelope = %serde_json::Value::Object(envelope.clone()), "envelope"),
	}
}

#[derive(Debug, Deserialize)]
struct Args {
	#[serde(default)]
	level: Level,
	qsize: Option<usize>,
}

struct Inner {
	name: String,
	sink: SinkBase,
	task: TaskHandle,
	level: Level,
}

/// A sink that logs every envelope it receives at a configurable level,
/// then drops it.
pub struct DebugSink {
	inner: Arc<Inner>,
}

impl DebugSink {
	pub fn new(name: &str, level: Level, qsize: Option<usize>) -> Self {
		Self {
			inner: Arc::new(Inner {
				name: name.to_string(),
				sink: SinkBase::new(qsize),
				task: TaskHandle::new(),
				level,
			}),
		}
	}
}

#[async_trait]
impl Node for DebugSink {
	fn name(&self) -> &str {
		&self.inner.name
	}

	fn type_name(&self) -> &str {
		"DebugSink"
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
							Some(envelope) => log_envelope(inner.level, &inner.name, &envelope),
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

	fn is_sink_capable(&self) -> bool {
		true
	}

	async fn write(&self, envelope: Envelope) -> Result<(), NodeRuntimeError> {
		self.inner.sink.write(envelope).await
	}
}

pub struct DebugSinkBuilder;

impl NodeBuilder for DebugSinkBuilder {
	fn type_name(&self) -> &str {
		"DebugSink"
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
		Ok(Arc::new(DebugSink::new(name, args.level, args.qsize)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn drains_queued_envelopes_before_stopping() {
		let sink = DebugSink::new("d", Level::Info, None);
		sink.start().await.unwrap();
		sink.write(Envelope::new()).await.unwrap();
		sink.write(Envelope::new()).await.unwrap();
		sink.stop().await.unwrap();
		sink.join().await.unwrap();
	}

	#[test]
	fn builder_defaults_to_info() {
		let builder = DebugSinkBuilder;
		let node = builder
			.build(
				"d",
				&serde_json::json!({}),
				&Arc::new(AgentContext {
					agent_id: uuid::Uuid::nil(),
					longitude: 0.0,
					latitude: 0.0,
				}),
			)
			.unwrap();
		assert_eq!(node.type_name(), "DebugSink");
	}
}
