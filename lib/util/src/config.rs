//! Loading and validating the agent's YAML configuration file.

use std::path::Path;

use serde::Deserialize;
use smartstring::{LazyCompact, SmartString};
use thiserror::Error;

use crate::logging::LoggingPreset;

fn default_heartbeat_interval() -> u64 {
	60
}

fn default_base_url() -> String {
	"http://localhost:8888/api".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Coordinate {
	pub longitude: f64,
	pub latitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
	pub user_name: SmartString<LazyCompact>,
	#[serde(default)]
	pub coordinate: Coordinate,
}

impl Default for Coordinate {
	fn default() -> Self {
		Self {
			longitude: 0.0,
			latitude: 0.0,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct CppSection {
	#[serde(default = "default_heartbeat_interval")]
	pub heartbeat_interval: u64,

	#[serde(default = "default_base_url")]
	pub base_url: String,
}

impl Default for CppSection {
	fn default() -> Self {
		Self {
			heartbeat_interval: default_heartbeat_interval(),
			base_url: default_base_url(),
		}
	}
}

/// A `(module, class)` pair naming a plug-in node type to register in
/// addition to the built-ins. There is no dynamic code loading: `module`
/// must name one of the plug-in families linked into this binary.
#[derive(Debug, Clone, Deserialize)]
pub struct NodePlugin {
	pub module: SmartString<LazyCompact>,
	pub class: SmartString<LazyCompact>,
}

/// The parsed, validated contents of `config.yml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
	pub agent: AgentSection,

	#[serde(default)]
	pub cpp: CppSection,

	#[serde(default)]
	pub nodes: Vec<NodePlugin>,

	#[serde(default)]
	pub loglevel: LoggingPreset,
}

/// An error encountered while loading the agent configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
	/// We could not read the configuration file from disk.
	#[error("could not read configuration file")]
	Io(#[source] std::io::Error),

	/// The configuration file's contents are not valid YAML, or do not
	/// match the expected schema.
	#[error("could not parse configuration file")]
	Parse(#[source] serde_yaml::Error),
}

/// Load and validate the agent configuration from `path`.
pub fn load_config(path: &Path) -> Result<AgentConfig, ConfigLoadError> {
	let text = std::fs::read_to_string(path).map_err(ConfigLoadError::Io)?;
	let config: AgentConfig = serde_yaml::from_str(&text).map_err(ConfigLoadError::Parse)?;
	Ok(config)
}

/// The default location of the configuration file:
/// `<config_home>/seot/config.yml`.
pub fn default_config_path() -> std::path::PathBuf {
	dirs::config_dir()
		.unwrap_or_else(|| std::path::PathBuf::from("."))
		.join("seot")
		.join("config.yml")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_minimal_config() {
		let yaml = "agent:\n  user_name: alice\n";
		let config: AgentConfig = serde_yaml::from_str(yaml).unwrap();
		assert_eq!(config.agent.user_name, "alice");
		assert_eq!(config.cpp.heartbeat_interval, 60);
		assert_eq!(config.cpp.base_url, "http://localhost:8888/api");
		assert!(config.nodes.is_empty());
	}

	#[test]
	fn parses_full_config() {
		let yaml = "\
agent:
  user_name: bob
  coordinate: { longitude: 1.5, latitude: -2.0 }
cpp:
  heartbeat_interval: 30
  base_url: http://coordinator.example/api
nodes:
  - { module: docker, class: DockerTransformer }
";
		let config: AgentConfig = serde_yaml::from_str(yaml).unwrap();
		assert_eq!(config.agent.coordinate.longitude, 1.5);
		assert_eq!(config.cpp.heartbeat_interval, 30);
		assert_eq!(config.nodes.len(), 1);
		assert_eq!(config.nodes[0].module, "docker");
	}

	#[test]
	fn rejects_missing_user_name() {
		let yaml = "agent: {}\n";
		let result: Result<AgentConfig, _> = serde_yaml::from_str(yaml);
		assert!(result.is_err());
	}
}
