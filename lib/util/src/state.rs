//! The agent's persistent identity: a UUID generated on first run and
//! held in a small YAML state file across restarts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// The on-disk shape of the state file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateFile {
	version: String,
	agent_id: Uuid,
}

/// An error encountered while loading or creating agent state.
#[derive(Debug, Error)]
pub enum StateLoadError {
	/// We could not read or create the state file or its parent directory.
	#[error("could not access state file")]
	Io(#[source] std::io::Error),

	/// The state file exists but its contents are not valid.
	#[error("could not parse state file")]
	Parse(#[source] serde_yaml::Error),
}

/// The agent's persistent identity, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
	pub agent_id: Uuid,
}

/// Load the agent's identity from `path`, generating and persisting a
/// fresh one if the file does not yet exist.
pub fn load_or_create_identity(path: &Path) -> Result<AgentIdentity, StateLoadError> {
	if path.exists() {
		let text = std::fs::read_to_string(path).map_err(StateLoadError::Io)?;
		let state: StateFile = serde_yaml::from_str(&text).map_err(StateLoadError::Parse)?;
		return Ok(AgentIdentity {
			agent_id: state.agent_id,
		});
	}

	info!(message = "No state file found, generating a new agent id");

	let state = StateFile {
		version: env!("CARGO_PKG_VERSION").into(),
		agent_id: Uuid::new_v4(),
	};

	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).map_err(StateLoadError::Io)?;
	}

	let text = serde_yaml::to_string(&state).map_err(StateLoadError::Parse)?;
	std::fs::write(path, text).map_err(StateLoadError::Io)?;

	info!(agent_id = %state.agent_id, "Generated new agent id");

	Ok(AgentIdentity {
		agent_id: state.agent_id,
	})
}

/// The default location of the state file: `<data_home>/seot/state.yml`.
pub fn default_state_path() -> std::path::PathBuf {
	dirs::data_dir()
		.unwrap_or_else(|| std::path::PathBuf::from("."))
		.join("seot")
		.join("state.yml")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn creates_state_on_first_run() {
		let dir = std::env::temp_dir().join(format!("seot-test-{}", Uuid::new_v4()));
		let path = dir.join("state.yml");

		let identity = load_or_create_identity(&path).unwrap();
		assert!(path.exists());

		// A second load must return the same id, not generate a new one.
		let identity2 = load_or_create_identity(&path).unwrap();
		assert_eq!(identity.agent_id, identity2.agent_id);

		std::fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn rejects_corrupt_state_file() {
		let dir = std::env::temp_dir().join(format!("seot-test-{}", Uuid::new_v4()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("state.yml");
		std::fs::write(&path, "not: [valid, state").unwrap();

		assert!(matches!(
			load_or_create_identity(&path),
			Err(StateLoadError::Parse(_))
		));

		std::fs::remove_dir_all(&dir).unwrap();
	}
}
