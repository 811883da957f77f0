use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use seot_node::{AgentContext, Envelope, Node, NodeError, NodeRuntimeError, SourceBase, TaskHandle};
use seot_registry::NodeBuilder;
use serde::Deserialize;
use serde_json::Value;

fn default_interval() -> u64 {
	1
}

#[derive(Debug, Deserialize)]
struct Args {
	#[serde(rename = "const")]
	payload: Value,
	#[serde(default = "default_interval")]
	interval: u64,
}

struct Inner {
	name: String,
	source: SourceBase,
	task: TaskHandle,
	payload: Value,
	interval: Duration,
}

/// A source that emits a fixed, configured envelope on a fixed interval.
pub struct ConstSource {
	inner: Arc<Inner>,
}

impl ConstSource {
	pub fn new(name: &str, agent: Arc<AgentContext>, payload: Value, interval_secs: u64) -> Self {
		Self {
			inner: Arc::new(Inner {
				name: name.to_string(),
				source: SourceBase::new(agent),
				task: TaskHandle::new(),
				payload,
				interval: Duration::from_secs(interval_secs.max(1)),
			}),
		}
	}
}

fn envelope_from(value: &Value) -> Envelope {
	match value {
		Value::Object(map) => map.clone(),
		other => {
			let mut envelope = Envelope::new();
			envelope.insert("payload".into(), other.clone());
			envelope
		}
	}
}

#[async_trait]
impl Node for ConstSource {
	fn name(&self) -> &str {
		&self.inner.name
	}

	fn type_name(&self) -> &str {
		"ConstSource"
	}

	fn running(&self) -> bool {
		self.inner.task.running()
	}

	async fn start(&self) -> Result<(), NodeError> {
		let inner = self.inner.clone();
		let cancel = self.inner.task.cancellation_token();

		self.inner.task.spawn(async move {
			let mut ticker = tokio::time::interval(inner.interval);
			loop {
				tokio::select! {
					_ = cancel.cancelled() => break,
					_ = ticker.tick() => {
						inner.source.emit(envelope_from(&inner.payload)).await;
					}
				}
			}
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
}

pub struct ConstSourceBuilder;

impl NodeBuilder for ConstSourceBuilder {
	fn type_name(&self) -> &str {
		"ConstSource"
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
		Ok(Arc::new(ConstSource::new(name, ctx.clone(), args.payload, args.interval)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration as StdDuration;

	fn ctx() -> Arc<AgentContext> {
		Arc::new(AgentContext {
			agent_id: uuid::Uuid::nil(),
			longitude: 0.0,
			latitude: 0.0,
		})
	}

	#[tokio::test]
	async fn start_then_stop_is_idempotence_checked() {
		let node = ConstSource::new("s", ctx(), serde_json::json!({"v": 1}), 1);
		node.start().await.unwrap();
		assert!(matches!(node.start().await, Err(NodeError::AlreadyRunning)));
		node.stop().await.unwrap();
		node.join().await.unwrap();
		assert!(matches!(node.stop().await, Err(NodeError::NotRunning)));
	}

	#[tokio::test]
	async fn emits_without_downstream_is_a_noop() {
		let node = ConstSource::new("s", ctx(), serde_json::json!({"v": 1}), 1);
		node.start().await.unwrap();
		tokio::time::sleep(StdDuration::from_millis(10)).await;
		node.stop().await.unwrap();
		node.join().await.unwrap();
	}

	#[test]
	fn builder_requires_const_argument() {
		let builder = ConstSourceBuilder;
		let result = builder.build("s", &serde_json::json!({}), &ctx());
		assert!(result.is_err());
	}
}
