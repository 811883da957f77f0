use std::{
	collections::{HashMap, HashSet},
	sync::Arc,
};

use seot_graph::Graph;
use seot_node::{AgentContext, Node};
use seot_registry::Registry;
use tracing::warn;

use crate::{errors::GraphSpecInvalid, spec::GraphSpec};

/// Validates a declarative graph description against a `Registry` and
/// materializes it as a live `Graph`.
pub struct GraphBuilder<'a> {
	registry: &'a Registry,
	agent: Arc<AgentContext>,
}

impl<'a> GraphBuilder<'a> {
	pub fn new(registry: &'a Registry, agent: Arc<AgentContext>) -> Self {
		Self { registry, agent }
	}

	/// Parse a JSON job description and build its graph.
	pub fn from_json(&self, text: &str) -> Result<Graph, GraphSpecInvalid> {
		let spec: GraphSpec =
			serde_json::from_str(text).map_err(|e| GraphSpecInvalid::Parse(e.to_string()))?;
		self.build(spec)
	}

	/// Parse a YAML job description and build its graph.
	pub fn from_yaml(&self, text: &str) -> Result<Graph, GraphSpecInvalid> {
		let spec: GraphSpec =
			serde_yaml::from_str(text).map_err(|e| GraphSpecInvalid::Parse(e.to_string()))?;
		self.build(spec)
	}

	/// Materialize an already-parsed job description.
	pub fn build(&self, spec: GraphSpec) -> Result<Graph, GraphSpecInvalid> {
		let mut seen = HashSet::with_capacity(spec.nodes.len());
		for node in &spec.nodes {
			if !seen.insert(node.name.clone()) {
				return Err(GraphSpecInvalid::DuplicateName(node.name.clone()));
			}
		}

		for node in &spec.nodes {
			if !self.registry.contains(&node.type_name) {
				return Err(GraphSpecInvalid::UnknownType {
					node: node.name.clone(),
					type_name: node.type_name.clone(),
				});
			}
		}

		let mut instances: HashMap<String, Arc<dyn Node>> = HashMap::with_capacity(spec.nodes.len());
		for node in &spec.nodes {
			// `contains` was checked above for every node, so this is
			// always `Some`.
			let built = self
				.registry
				.build(&node.type_name, &node.name, &node.args, &self.agent)
				.unwrap()
				.map_err(|cause| GraphSpecInvalid::ConstructFailed {
					name: node.name.clone(),
					cause: Arc::new(cause),
				})?;
			instances.insert(node.name.clone(), built);
		}

		// Declaration order, so the remaining source set (and therefore
		// the graph's topological order among independent sources) is
		// deterministic.
		let mut is_source: Vec<(String, bool)> = spec
			.nodes
			.iter()
			.map(|n| (n.name.clone(), true))
			.collect();

		for node in &spec.nodes {
			let producer = instances.get(&node.name).cloned().unwrap();
			for target_name in &node.to {
				let Some(consumer) = instances.get(target_name).cloned() else {
					warn!(
						from = %node.name,
						to = %target_name,
						"edge target is not defined in this graph; dropping"
					);
					continue;
				};

				producer
					.connect(consumer)
					.map_err(|_| GraphSpecInvalid::TypeMismatch {
						from: node.name.clone(),
						to: target_name.clone(),
					})?;

				if let Some(entry) = is_source.iter_mut().find(|(name, _)| name == target_name) {
					entry.1 = false;
				}
			}
		}

		let sources: Vec<Arc<dyn Node>> = is_source
			.into_iter()
			.filter(|(_, is_source)| *is_source)
			.filter_map(|(name, _)| instances.get(&name).cloned())
			.collect();

		Ok(Graph::new(sources)?)
	}
}
