//! The dataflow graph: topological ordering plus coordinated
//! startup/start/stop/cleanup across a DAG of nodes.

mod errors;
mod graph;
mod toposort;

pub use errors::GraphError;
pub use graph::{DoneCallback, Graph};
pub use toposort::toposort;
