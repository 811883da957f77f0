//! The node capability interface, envelope type, and the `Source`/`Sink`
//! building blocks concrete node implementations compose.

mod envelope;
mod errors;
mod node;
mod sink;
mod source;
mod task;

pub use envelope::{stamp, AgentContext, Envelope, EnvelopeMeta};
pub use errors::{NodeError, NodeRuntimeError, NodeStartupError};
pub use node::Node;
pub use sink::{Receiver as SinkReceiver, SinkBase};
pub use source::SourceBase;
pub use task::TaskHandle;
