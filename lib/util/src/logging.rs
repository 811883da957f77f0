use std::{fmt::Display, str::FromStr};

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
	Trace,
	Debug,
	Info,
	Warn,
	Error,
}

impl Default for LogLevel {
	fn default() -> Self {
		Self::Info
	}
}

impl Display for LogLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Trace => write!(f, "trace"),
			Self::Debug => write!(f, "debug"),
			Self::Info => write!(f, "info"),
			Self::Warn => write!(f, "warn"),
			Self::Error => write!(f, "error"),
		}
	}
}

/// A coarse logging preset, selected by config or `-v`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub enum LoggingPreset {
	#[default]
	Default,
	Verbose,
	Develop,
	Trace,
}

impl LoggingPreset {
	/// Step this preset up by one level of verbosity, as `-v` does.
	pub fn bump(self) -> Self {
		match self {
			Self::Default => Self::Verbose,
			Self::Verbose => Self::Develop,
			Self::Develop | Self::Trace => Self::Trace,
		}
	}

	pub fn get_config(&self) -> LoggingConfig {
		match self {
			Self::Default => LoggingConfig {
				other: LogLevel::Warn,
				http: LogLevel::Warn,
				supervisor: LogLevel::Info,
				graph: LogLevel::Info,
				builder: LogLevel::Info,
				nodes: LogLevel::Warn,
			},

			Self::Verbose => LoggingConfig {
				other: LogLevel::Warn,
				http: LogLevel::Warn,
				supervisor: LogLevel::Debug,
				graph: LogLevel::Debug,
				builder: LogLevel::Debug,
				nodes: LogLevel::Info,
			},

			Self::Develop => LoggingConfig {
				other: LogLevel::Debug,
				http: LogLevel::Debug,
				supervisor: LogLevel::Trace,
				graph: LogLevel::Trace,
				builder: LogLevel::Debug,
				nodes: LogLevel::Debug,
			},

			Self::Trace => LoggingConfig {
				other: LogLevel::Trace,
				http: LogLevel::Trace,
				supervisor: LogLevel::Trace,
				graph: LogLevel::Trace,
				builder: LogLevel::Trace,
				nodes: LogLevel::Trace,
			},
		}
	}
}

/// Per-module log levels, derived from a [`LoggingPreset`].
pub struct LoggingConfig {
	other: LogLevel,
	http: LogLevel,

	supervisor: LogLevel,
	graph: LogLevel,
	builder: LogLevel,
	nodes: LogLevel,
}

#[allow(clippy::from_over_into)]
impl Into<EnvFilter> for LoggingConfig {
	fn into(self) -> EnvFilter {
		EnvFilter::from_str(
			&[
				format!("reqwest={}", self.http),
				format!("seot_graph={}", self.graph),
				format!("seot_builder={}", self.builder),
				format!("seot_agent::supervisor={}", self.supervisor),
				format!("nodes_basic={}", self.nodes),
				self.other.to_string(),
			]
			.join(","),
		)
		.unwrap_or_else(|_| EnvFilter::new("info"))
	}
}
