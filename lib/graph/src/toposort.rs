use std::{collections::HashMap, sync::Arc};

use seot_node::Node;

use crate::errors::GraphError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
	Gray,
	Black,
}

/// Topologically sort every node reachable from `sources`, in an order
/// where producers precede the consumers they write to. Visiting a node
/// already on the current DFS path (colored `Gray`) means the node set
/// contains a cycle.
///
/// Node identity is tracked by name: the builder guarantees names are
/// unique within one graph description.
pub fn toposort(sources: &[Arc<dyn Node>]) -> Result<Vec<Arc<dyn Node>>, GraphError> {
	let mut color: HashMap<String, Color> = HashMap::new();
	let mut finished: Vec<Arc<dyn Node>> = Vec::new();

	for source in sources {
		visit(source, &mut color, &mut finished)?;
	}

	// Post-order DFS, reversed: every node precedes all of its
	// descendants (i.e. producers precede consumers).
	finished.reverse();
	Ok(finished)
}

fn visit(
	node: &Arc<dyn Node>,
	color: &mut HashMap<String, Color>,
	finished: &mut Vec<Arc<dyn Node>>,
) -> Result<(), GraphError> {
	match color.get(node.name()) {
		Some(Color::Black) => return Ok(()),
		Some(Color::Gray) => return Err(GraphError::ContainsCycle),
		None => {}
	}

	color.insert(node.name().to_string(), Color::Gray);
	for next in node.next_nodes() {
		visit(&next, color, finished)?;
	}
	color.insert(node.name().to_string(), Color::Black);
	finished.push(node.clone());

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use seot_node::{Envelope, NodeError, NodeRuntimeError, NodeStartupError};
	use std::sync::Mutex;

	struct TestNode {
		name: String,
		downstream: Mutex<Vec<Arc<dyn Node>>>,
	}

	impl TestNode {
		fn new(name: &str) -> Arc<Self> {
			Arc::new(Self {
				name: name.into(),
				downstream: Mutex::new(Vec::new()),
			})
		}

		fn connect(self: &Arc<Self>, next: Arc<dyn Node>) {
			self.downstream.lock().unwrap().push(next);
		}
	}

	#[async_trait]
	impl Node for TestNode {
		fn name(&self) -> &str {
			&self.name
		}
		fn type_name(&self) -> &str {
			"Test"
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
		fn next_nodes(&self) -> Vec<Arc<dyn Node>> {
			self.downstream.lock().unwrap().clone()
		}
	}

	#[allow(dead_code)]
	async fn unused(_: NodeStartupError, _: NodeRuntimeError, _: Envelope) {}

	#[test]
	fn orders_producers_before_consumers() {
		let a = TestNode::new("a");
		let b = TestNode::new("b");
		let c = TestNode::new("c");
		a.connect(b.clone());
		b.connect(c.clone());

		let order = toposort(&[a.clone() as Arc<dyn Node>]).unwrap();
		let names: Vec<&str> = order.iter().map(|n| n.name()).collect();
		assert_eq!(names, vec!["a", "b", "c"]);
	}

	#[test]
	fn detects_cycle() {
		let a = TestNode::new("a");
		let b = TestNode::new("b");
		a.connect(b.clone());
		b.connect(a.clone());

		let result = toposort(&[a.clone() as Arc<dyn Node>]);
		assert!(matches!(result, Err(GraphError::ContainsCycle)));
	}

	#[test]
	fn diamond_visits_shared_sink_once() {
		let a = TestNode::new("a");
		let b = TestNode::new("b");
		let c = TestNode::new("c");
		let d = TestNode::new("d");
		a.connect(b.clone());
		a.connect(c.clone());
		b.connect(d.clone());
		c.connect(d.clone());

		let order = toposort(&[a.clone() as Arc<dyn Node>]).unwrap();
		assert_eq!(order.len(), 4);
		let d_pos = order.iter().position(|n| n.name() == "d").unwrap();
		assert_eq!(d_pos, 3);
	}
}
