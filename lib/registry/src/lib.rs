//! The process-wide map from node-type name to constructor.
//!
//! Populated exactly once at process init: built-in node types are
//! registered unconditionally, then any `(module, class)` plug-ins named
//! in the configuration file are resolved against the fixed, compile-time
//! table of linkable plug-in families; there is no dynamic module loading.
//! The registry is treated as immutable once startup completes.

use std::{collections::BTreeMap, sync::Arc};

use seot_node::{AgentContext, Node};
use seot_util::config::NodePlugin;
use smartstring::{LazyCompact, SmartString};
use tracing::warn;

/// Constructs a node instance of one registered type from its builder
/// arguments.
pub trait NodeBuilder: Send + Sync {
	/// The type name this builder registers under.
	fn type_name(&self) -> &str;

	/// `true` iff this node type can operate on the current platform
	/// (e.g. required hardware or services are present). Evaluated once,
	/// at registration time.
	fn can_run(&self) -> bool;

	/// Build one node instance. `args` are the job description's `args`
	/// mapping for this node, as raw JSON; unrecognized keys should be
	/// ignored, missing required keys should fail construction.
	fn build(
		&self,
		name: &str,
		args: &serde_json::Value,
		ctx: &Arc<AgentContext>,
	) -> anyhow::Result<Arc<dyn Node>>;
}

/// A family of plug-in node types linkable into this binary, named by the
/// `module` field of a configuration `nodes:` entry.
pub type PluginFamily = fn() -> Vec<Box<dyn NodeBuilder>>;

/// The process-wide node-type registry.
pub struct Registry {
	builders: BTreeMap<SmartString<LazyCompact>, Box<dyn NodeBuilder>>,
}

impl Registry {
	pub fn new() -> Self {
		Self {
			builders: BTreeMap::new(),
		}
	}

	/// Register every builder from `builtins`, unconditionally ahead of
	/// any configured plug-ins, filtering out types whose `can_run()`
	/// returns false.
	pub fn register_builtins(&mut self, builtins: Vec<Box<dyn NodeBuilder>>) {
		for builder in builtins {
			self.register(builder);
		}
	}

	/// Resolve the configured `nodes:` plug-in list against the fixed set
	/// of compiled-in plug-in families. A `module` not present in `known`
	/// is logged at warn level and produces no registration
	/// (`PlugInUnavailable`).
	pub fn apply_plugin_config(
		&mut self,
		configured: &[NodePlugin],
		known: &[(&str, PluginFamily)],
	) {
		for plugin in configured {
			match known.iter().find(|(module, _)| *module == plugin.module) {
				Some((_, family)) => {
					let found = family().into_iter().find(|b| b.type_name() == plugin.class);
					match found {
						Some(builder) => self.register(builder),
						None => warn!(
							module = %plugin.module,
							class = %plugin.class,
							"module is linked but does not provide this node class"
						),
					}
				}
				None => {
					warn!(
						module = %plugin.module,
						class = %plugin.class,
						"plug-in module is not linked into this build; node type unavailable"
					);
				}
			}
		}
	}

	/// Register one builder, applying the last-wins-with-warning rule and
	/// the `can_run()` platform filter.
	fn register(&mut self, builder: Box<dyn NodeBuilder>) {
		if !builder.can_run() {
			warn!(
				type_name = builder.type_name(),
				"node type is not usable on this platform; omitting from registry"
			);
			return;
		}

		let key: SmartString<LazyCompact> = builder.type_name().into();
		if self.builders.contains_key(&key) {
			warn!(type_name = %key, "a node type with this name is already registered; replacing it");
		}
		self.builders.insert(key, builder);
	}

	/// Construct a node instance of the given registered type.
	pub fn build(
		&self,
		type_name: &str,
		name: &str,
		args: &serde_json::Value,
		ctx: &Arc<AgentContext>,
	) -> Option<anyhow::Result<Arc<dyn Node>>> {
		self.builders
			.get(type_name)
			.map(|builder| builder.build(name, args, ctx))
	}

	/// `true` iff a node type with this name is registered.
	pub fn contains(&self, type_name: &str) -> bool {
		self.builders.contains_key(type_name)
	}

	/// The type names of every registered node, for inclusion in
	/// heartbeats.
	pub fn type_names(&self) -> Vec<String> {
		self.builders.keys().map(|k| k.to_string()).collect()
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use seot_node::{NodeError, NodeRuntimeError};

	struct AlwaysBuilder {
		name: &'static str,
		can_run: bool,
	}

	struct DummyNode(String);

	#[async_trait]
	impl Node for DummyNode {
		fn name(&self) -> &str {
			&self.0
		}
		fn type_name(&self) -> &str {
			"Dummy"
		}
		fn running(&self) -> bool {
			false
		}
		async fn start(&self) -> Result<(), NodeError> {
			Ok(())
		}
		async fn stop(&self) -> Result<(), NodeError> {
			Ok(())
		}
	}

	impl NodeBuilder for AlwaysBuilder {
		fn type_name(&self) -> &str {
			self.name
		}
		fn can_run(&self) -> bool {
			self.can_run
		}
		fn build(
			&self,
			name: &str,
			_args: &serde_json::Value,
			_ctx: &Arc<AgentContext>,
		) -> anyhow::Result<Arc<dyn Node>> {
			Ok(Arc::new(DummyNode(name.to_string())))
		}
	}

	fn ctx() -> Arc<AgentContext> {
		Arc::new(AgentContext {
			agent_id: uuid::Uuid::nil(),
			longitude: 0.0,
			latitude: 0.0,
		})
	}

	#[test]
	fn omits_types_that_cannot_run() {
		let mut registry = Registry::new();
		registry.register_builtins(vec![Box::new(AlwaysBuilder {
			name: "Unavailable",
			can_run: false,
		})]);
		assert!(!registry.contains("Unavailable"));
	}

	#[test]
	fn last_registration_wins() {
		let mut registry = Registry::new();
		registry.register_builtins(vec![
			Box::new(AlwaysBuilder {
				name: "Thing",
				can_run: true,
			}),
			Box::new(AlwaysBuilder {
				name: "Thing",
				can_run: true,
			}),
		]);
		assert_eq!(registry.type_names(), vec!["Thing".to_string()]);
	}

	#[test]
	fn unknown_plugin_module_is_omitted() {
		let mut registry = Registry::new();
		registry.apply_plugin_config(
			&[NodePlugin {
				module: "docker".into(),
				class: "DockerTransformer".into(),
			}],
			&[],
		);
		assert!(registry.type_names().is_empty());
	}

	#[test]
	fn builds_a_registered_node() {
		let mut registry = Registry::new();
		registry.register_builtins(vec![Box::new(AlwaysBuilder {
			name: "Thing",
			can_run: true,
		})]);

		let node = registry
			.build("Thing", "n1", &serde_json::json!({}), &ctx())
			.unwrap()
			.unwrap();
		assert_eq!(node.name(), "n1");
	}
}
