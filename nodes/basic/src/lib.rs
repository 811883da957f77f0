//! The agent's built-in node types, registered unconditionally at startup
//! ahead of any configured plug-ins: [`ConstSource`], [`NullSource`],
//! [`DebugSink`], [`NullSink`], and [`IdentityTransformer`].

mod const_source;
mod debug_sink;
mod identity;
mod null_sink;
mod null_source;

pub use const_source::{ConstSource, ConstSourceBuilder};
pub use debug_sink::{DebugSink, DebugSinkBuilder};
pub use identity::{IdentityTransformer, IdentityTransformerBuilder};
pub use null_sink::{NullSink, NullSinkBuilder};
pub use null_source::{NullSource, NullSourceBuilder};

use seot_registry::NodeBuilder;

/// Every built-in node type's builder, ready for
/// [`seot_registry::Registry::register_builtins`].
pub fn builders() -> Vec<Box<dyn NodeBuilder>> {
	vec![
		Box::new(ConstSourceBuilder),
		Box::new(NullSourceBuilder),
		Box::new(DebugSinkBuilder),
		Box::new(NullSinkBuilder),
		Box::new(IdentityTransformerBuilder),
	]
}
