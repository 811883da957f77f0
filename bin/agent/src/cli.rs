//! Command-line flags for the agent's single entry point.

use std::path::PathBuf;

use clap::Parser;
use seot_util::{config::default_config_path, state::default_state_path};

#[derive(Debug, Parser)]
#[command(name = "seot-agent", version, about = "Coordinator-directed dataflow agent")]
pub struct Args {
	/// Path to the agent's YAML configuration file.
	#[arg(short, long, default_value_os_t = default_config_path())]
	pub config: PathBuf,

	/// Path to the agent's persistent state file.
	#[arg(short, long, default_value_os_t = default_state_path())]
	pub state: PathBuf,

	/// Raise the logging preset by one step. May be repeated (`-vv`, `-vvv`).
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}
