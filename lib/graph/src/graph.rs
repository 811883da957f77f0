use std::sync::{
	atomic::{AtomicBool, Ordering},
	Arc, Mutex,
};

use futures::{future::join_all, stream::FuturesUnordered, StreamExt};
use seot_node::{Node, NodeRuntimeError};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::{errors::GraphError, toposort::toposort};

/// A callback invoked once the graph's supervisor task terminates (either
/// because every node finished on its own, or because a node runtime error
/// forced a shutdown of its siblings).
pub type DoneCallback = Box<dyn FnOnce(Option<NodeRuntimeError>) + Send>;

/// A DAG of dataflow nodes, materialized by a `GraphBuilder` from one or
/// more source nodes. Traversal is deferred: the topological order is
/// computed once, at construction, and reused by every lifecycle call.
pub struct Graph {
	/// Every reachable node, producers before consumers.
	topo_order: Vec<Arc<dyn Node>>,
	running: Arc<AtomicBool>,
	last_error: Arc<Mutex<Option<NodeRuntimeError>>>,
	supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl Graph {
	/// Build a graph from its source nodes. Fails if there are no sources,
	/// or if the reachable node set contains a cycle.
	pub fn new(sources: Vec<Arc<dyn Node>>) -> Result<Self, GraphError> {
		if sources.is_empty() {
			return Err(GraphError::NoSources);
		}

		let topo_order = toposort(&sources)?;

		Ok(Self {
			topo_order,
			running: Arc::new(AtomicBool::new(false)),
			last_error: Arc::new(Mutex::new(None)),
			supervisor: Mutex::new(None),
		})
	}

	/// `true` iff the graph's supervisor task is scheduled and has not yet
	/// returned.
	pub fn running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	/// The runtime error that caused the last run to terminate early, if
	/// any.
	pub fn last_error(&self) -> Option<NodeRuntimeError> {
		self.last_error.lock().unwrap_or_else(|e| e.into_inner()).clone()
	}

	/// Every node reachable from the graph's sources, in startup order.
	pub fn nodes(&self) -> &[Arc<dyn Node>] {
		&self.topo_order
	}

	/// Concurrently invoke `startup()` on every reachable node. On any
	/// failure: abort the startups still pending, run `cleanup()` on every
	/// node whose `startup()` had already completed, then fail with
	/// [`GraphError::StartupFailed`].
	pub async fn startup(&self) -> Result<(), GraphError> {
		let mut pending: Vec<JoinHandle<(Arc<dyn Node>, Result<(), seot_node::NodeStartupError>)>> =
			self.topo_order
				.iter()
				.cloned()
				.map(|node| {
					tokio::spawn(async move {
						let result = node.startup().await;
						(node, result)
					})
				})
				.collect();

		let mut succeeded: Vec<Arc<dyn Node>> = Vec::new();
		let mut failure: Option<anyhow::Error> = None;

		while !pending.is_empty() {
			let (joined, _idx, rest) = futures::future::select_all(pending).await;
			pending = rest;

			match joined {
				Ok((node, Ok(()))) => succeeded.push(node),
				Ok((node, Err(err))) => {
					error!(node = node.name(), error = %err.0, "node startup failed");
					failure = Some(err.0);
					break;
				}
				Err(join_err) => {
					failure = Some(anyhow::Error::new(join_err));
					break;
				}
			}
		}

		if let Some(cause) = failure {
			for handle in pending {
				handle.abort();
			}
			join_all(succeeded.iter().map(|n| n.cleanup())).await;
			return Err(GraphError::StartupFailed {
				cause: Arc::new(cause),
			});
		}

		Ok(())
	}

	/// Concurrently launch every node's work task, then spawn a supervisor
	/// task that waits for the first failure (or for every node to finish
	/// on its own). `running()` is true as soon as this call returns and
	/// false once the supervisor task terminates.
	pub async fn start(&self, done: Option<DoneCallback>) -> Result<(), GraphError> {
		for node in &self.topo_order {
			node.start()
				.await
				.map_err(|cause| GraphError::StartupFailed {
					cause: Arc::new(anyhow::Error::new(cause)),
				})?;
		}

		self.running.store(true, Ordering::SeqCst);

		let nodes = self.topo_order.clone();
		let running = self.running.clone();
		let last_error = self.last_error.clone();

		let handle = tokio::spawn(async move {
			let mut joins: FuturesUnordered<_> = nodes
				.iter()
				.cloned()
				.map(|n| async move { (n.clone(), n.join().await) })
				.collect();

			let mut failure = None;
			while let Some((node, result)) = joins.next().await {
				if let Err(err) = result {
					failure = Some((node, err));
					break;
				}
			}

			let outcome = if let Some((failed, err)) = failure {
				error!(node = failed.name(), error = %err, "node failed, stopping siblings");
				for n in &nodes {
					if n.running() {
						if let Err(stop_err) = n.stop().await {
							warn!(node = n.name(), error = %stop_err, "failed to stop sibling node");
						}
					}
				}
				join_all(nodes.iter().map(|n| n.join())).await;
				*last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(err.clone());
				Some(err)
			} else {
				None
			};

			running.store(false, Ordering::SeqCst);
			if let Some(cb) = done {
				cb(outcome);
			}
		});

		*self.supervisor.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
		Ok(())
	}

	/// No-op if not running. Otherwise requests `stop()` on every running
	/// node, awaits every node's completion, then awaits the supervisor
	/// task so a registered done-callback completes before this returns.
	pub async fn stop(&self) {
		if !self.running() {
			return;
		}

		for node in &self.topo_order {
			if node.running() {
				if let Err(err) = node.stop().await {
					warn!(node = node.name(), error = %err, "failed to stop node");
				}
			}
		}

		join_all(self.topo_order.iter().map(|n| n.join())).await;

		let supervisor = self.supervisor.lock().unwrap_or_else(|e| e.into_inner()).take();
		if let Some(handle) = supervisor {
			let _ = handle.await;
		}
	}

	/// Concurrently invoke `cleanup()` on every node. Individual failures
	/// are logged by the node itself; this call never fails.
	pub async fn cleanup(&self) {
		join_all(self.topo_order.iter().rev().map(|n| n.cleanup())).await;
	}
}
