//! The supervisory control loop: periodic heartbeats, and resolution of
//! the coordinator's `run`/`kill` directives into `GraphBuilder` + `Graph`
//! lifecycle calls. Tracks active jobs by identifier.

use std::{
	collections::{BTreeMap, HashMap},
	sync::Arc,
	time::Duration,
};

use seot_builder::GraphBuilder;
use seot_coordinator::{parse_directive, CoordinatorClient, HeartbeatDirective};
use seot_graph::Graph;
use seot_node::AgentContext;
use seot_registry::Registry;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// The pieces of agent configuration the supervisor needs on every tick,
/// beyond the registry and coordinator client.
pub struct SupervisorConfig {
	pub user_name: String,
	pub heartbeat_interval: Duration,
	pub facts: BTreeMap<String, String>,
}

/// Runs the heartbeat loop and owns the map from job id to its live graph.
/// The job map is mutated only by this struct's own methods; under the
/// single-threaded scheduler this runs on, that makes it lock-free.
pub struct Supervisor {
	registry: Registry,
	agent: Arc<AgentContext>,
	client: CoordinatorClient,
	config: SupervisorConfig,
	jobs: HashMap<String, Graph>,
}

impl Supervisor {
	pub fn new(
		registry: Registry,
		agent: Arc<AgentContext>,
		client: CoordinatorClient,
		config: SupervisorConfig,
	) -> Self {
		Self {
			registry,
			agent,
			client,
			config,
			jobs: HashMap::new(),
		}
	}

	/// Run the heartbeat loop until `shutdown` is cancelled (by a signal
	/// handler in `main`), then run the shutdown sequence: stop and clean
	/// up every job still tracked, in no particular order since each is
	/// independent.
	pub async fn run(&mut self, shutdown: CancellationToken) {
		loop {
			self.tick().await;

			tokio::select! {
				_ = shutdown.cancelled() => break,
				_ = tokio::time::sleep(self.config.heartbeat_interval) => {}
			}
		}

		info!("shutdown signal received, tearing down active jobs");
		let job_ids: Vec<String> = self.jobs.keys().cloned().collect();
		for job_id in job_ids {
			self.stop_job(&job_id).await;
		}
	}

	/// One heartbeat: send it, then dispatch whatever directive comes
	/// back. A heartbeat that fails outright (logged already by the
	/// coordinator client) is treated as a no-op; the loop always
	/// continues.
	async fn tick(&mut self) {
		let body = serde_json::json!({
			"user_name": self.config.user_name,
			"agent_id": self.agent.agent_id,
			"longitude": self.agent.longitude,
			"latitude": self.agent.latitude,
			"nodes": self.registry.type_names(),
			"facts": self.config.facts,
		});

		let Some(response) = self.client.heartbeat(&body).await else {
			return;
		};

		match parse_directive(&response) {
			HeartbeatDirective::None => info!("heartbeat: nothing to do"),
			HeartbeatDirective::Run(job_id) => self.start_job(job_id).await,
			HeartbeatDirective::Kill(job_id) => self.stop_job(&job_id).await,
		}
	}

	/// Resolve a `run` directive: fetch the job description, accept or
	/// reject it, build and start the graph.
	async fn start_job(&mut self, job_id: String) {
		if self.jobs.contains_key(&job_id) {
			warn!(job_id = %job_id, "job already running; rejecting duplicate run directive");
			self.client.reject_job(&job_id).await;
			return;
		}

		let Some(mut description) = self.client.get_job(&job_id).await else {
			error!(job_id = %job_id, "failed to fetch job description");
			return;
		};

		// These fields are only meaningful to the coordinator; the builder's
		// schema knows nothing about them.
		if let Value::Object(map) = &mut description {
			map.remove("application_id");
			map.remove("job_id");
		}

		self.client.accept_job(&job_id).await;

		let builder = GraphBuilder::new(&self.registry, self.agent.clone());
		let graph = match serde_json::from_value(description)
			.map_err(|e| seot_builder::GraphSpecInvalid::Parse(e.to_string()))
			.and_then(|spec| builder.build(spec))
		{
			Ok(graph) => graph,
			Err(cause) => {
				error!(job_id = %job_id, error = %cause, "job description is invalid");
				self.client.stop_job(&job_id).await;
				return;
			}
		};

		if let Err(cause) = graph.startup().await {
			error!(job_id = %job_id, error = %cause, "job startup failed");
			self.client.stop_job(&job_id).await;
			graph.cleanup().await;
			return;
		}

		if let Err(cause) = graph.start(None).await {
			error!(job_id = %job_id, error = %cause, "job failed to start");
			self.client.stop_job(&job_id).await;
			graph.cleanup().await;
			return;
		}

		info!(job_id = %job_id, "job started");
		self.jobs.insert(job_id, graph);
	}

	/// Resolve a `kill` directive (or tear down a job at shutdown): stop
	/// and clean up its graph, then notify the coordinator and forget it.
	async fn stop_job(&mut self, job_id: &str) {
		let Some(graph) = self.jobs.remove(job_id) else {
			warn!(job_id = %job_id, "kill directive for a job that is not tracked");
			return;
		};

		graph.stop().await;
		graph.cleanup().await;
		self.client.stop_job(job_id).await;
		info!(job_id = %job_id, "job stopped");
	}
}

#[cfg(test)]
mod tests {
	use std::{
		net::SocketAddr,
		sync::atomic::{AtomicU32, Ordering},
	};

	use axum::{
		extract::{Path, State},
		routing::{get, post},
		Json, Router,
	};
	use uuid::Uuid;

	use super::*;

	#[derive(Default)]
	struct MockState {
		directive: serde_json::Value,
		job: serde_json::Value,
		accepts: AtomicU32,
		rejects: AtomicU32,
		stops: AtomicU32,
	}

	async fn spawn_mock(state: Arc<MockState>) -> String {
		let app = Router::new()
			.route(
				"/heartbeat",
				post(|State(state): State<Arc<MockState>>| async move { Json(state.directive.clone()) }),
			)
			.route(
				"/job/:id",
				get(|State(state): State<Arc<MockState>>, Path(_id): Path<String>| async move {
					Json(state.job.clone())
				}),
			)
			.route(
				"/job/:id/accept",
				post(|State(state): State<Arc<MockState>>| async move {
					state.accepts.fetch_add(1, Ordering::SeqCst);
					Json(serde_json::json!({}))
				}),
			)
			.route(
				"/job/:id/reject",
				post(|State(state): State<Arc<MockState>>| async move {
					state.rejects.fetch_add(1, Ordering::SeqCst);
					Json(serde_json::json!({}))
				}),
			)
			.route(
				"/job/:id/stop",
				post(|State(state): State<Arc<MockState>>| async move {
					state.stops.fetch_add(1, Ordering::SeqCst);
					Json(serde_json::json!({}))
				}),
			)
			.with_state(state);

		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr: SocketAddr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			let _ = axum::serve(listener, app).await;
		});
		format!("http://{addr}")
	}

	fn supervisor(base_url: String) -> Supervisor {
		let mut registry = Registry::new();
		registry.register_builtins(nodes_basic::builders());

		Supervisor::new(
			registry,
			Arc::new(AgentContext {
				agent_id: Uuid::nil(),
				longitude: 0.0,
				latitude: 0.0,
			}),
			CoordinatorClient::new(base_url),
			SupervisorConfig {
				user_name: "alice".into(),
				heartbeat_interval: Duration::from_secs(60),
				facts: BTreeMap::new(),
			},
		)
	}

	#[tokio::test]
	async fn heartbeat_no_op_leaves_job_map_unchanged() {
		let state = Arc::new(MockState {
			directive: serde_json::json!({}),
			..Default::default()
		});
		let mut sup = supervisor(spawn_mock(state).await);
		sup.tick().await;
		assert!(sup.jobs.is_empty());
	}

	#[tokio::test]
	async fn run_then_kill_round_trip() {
		let state = Arc::new(MockState {
			directive: serde_json::json!({"run": "J1"}),
			job: serde_json::json!({"nodes": [
				{"name": "s", "type": "ConstSource", "args": {"const": {"v": 1}, "interval": 1}, "to": ["d"]},
				{"name": "d", "type": "DebugSink"}
			]}),
			..Default::default()
		});
		let mut sup = supervisor(spawn_mock(state.clone()).await);

		sup.tick().await;
		assert!(sup.jobs.contains_key("J1"));
		assert_eq!(state.accepts.load(Ordering::SeqCst), 1);

		sup.stop_job("J1").await;
		assert!(!sup.jobs.contains_key("J1"));
		assert_eq!(state.stops.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn duplicate_run_is_rejected() {
		let state = Arc::new(MockState {
			directive: serde_json::json!({"run": "J1"}),
			job: serde_json::json!({"nodes": [{"name": "s", "type": "NullSource"}]}),
			..Default::default()
		});
		let mut sup = supervisor(spawn_mock(state.clone()).await);

		sup.start_job("J1".into()).await;
		assert_eq!(state.accepts.load(Ordering::SeqCst), 1);

		sup.start_job("J1".into()).await;
		assert_eq!(state.rejects.load(Ordering::SeqCst), 1);
		assert_eq!(sup.jobs.len(), 1);
	}

	#[tokio::test]
	async fn cyclic_description_is_not_registered() {
		let state = Arc::new(MockState {
			job: serde_json::json!({"nodes": [
				{"name": "a", "type": "IdentityTransformer", "to": ["b"]},
				{"name": "b", "type": "IdentityTransformer", "to": ["a"]}
			]}),
			..Default::default()
		});
		let mut sup = supervisor(spawn_mock(state.clone()).await);

		sup.start_job("J3".into()).await;
		assert!(sup.jobs.is_empty());
		assert_eq!(state.stops.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn kill_of_untracked_job_is_a_noop() {
		let state = Arc::new(MockState::default());
		let mut sup = supervisor(spawn_mock(state).await);
		sup.stop_job("nope").await;
		assert!(sup.jobs.is_empty());
	}
}
