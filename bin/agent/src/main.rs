//! The agent's single entry point: parses CLI flags, loads configuration
//! and persistent identity, builds the node registry, then runs the
//! supervisor until a shutdown signal arrives.

mod cli;
mod supervisor;

use std::sync::Arc;

use clap::Parser;
use seot_node::AgentContext;
use seot_registry::{PluginFamily, Registry};
use seot_util::{config, facts, state};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::supervisor::{Supervisor, SupervisorConfig};

/// The compiled-in plug-in families this binary can resolve a `nodes:`
/// config entry against. There is no dynamic module loading; a `module`
/// naming anything else is logged and its node types are omitted from
/// the registry.
const KNOWN_PLUGIN_FAMILIES: &[(&str, PluginFamily)] = &[("basic", nodes_basic::builders)];

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let args = cli::Args::parse();

	let config = match config::load_config(&args.config) {
		Ok(config) => config,
		Err(err) => {
			eprintln!("failed to load configuration from {}: {err}", args.config.display());
			std::process::exit(1);
		}
	};

	let mut preset = config.loglevel;
	for _ in 0..args.verbose {
		preset = preset.bump();
	}
	tracing_subscriber::fmt()
		.with_env_filter(preset.get_config())
		.without_time()
		.with_ansi(true)
		.init();

	info!(path = %args.config.display(), "loaded configuration");

	let identity = match state::load_or_create_identity(&args.state) {
		Ok(identity) => identity,
		Err(err) => {
			error!(path = %args.state.display(), error = %err, "failed to load agent state");
			std::process::exit(1);
		}
	};

	let facts = facts::discover_facts();
	info!(?facts, "discovered host facts");

	let agent = Arc::new(AgentContext {
		agent_id: identity.agent_id,
		longitude: config.agent.coordinate.longitude,
		latitude: config.agent.coordinate.latitude,
	});

	let mut registry = Registry::new();
	registry.register_builtins(nodes_basic::builders());
	registry.apply_plugin_config(&config.nodes, KNOWN_PLUGIN_FAMILIES);

	let client = seot_coordinator::CoordinatorClient::new(config.cpp.base_url.clone());
	let supervisor_config = SupervisorConfig {
		user_name: config.agent.user_name.to_string(),
		heartbeat_interval: std::time::Duration::from_secs(config.cpp.heartbeat_interval),
		facts,
	};

	let mut supervisor = Supervisor::new(registry, agent, client, supervisor_config);

	let shutdown = CancellationToken::new();
	let shutdown_signal = shutdown.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			info!("received interrupt, shutting down");
			shutdown_signal.cancel();
		}
	});

	supervisor.run(shutdown).await;
	info!("agent shut down cleanly");
}
