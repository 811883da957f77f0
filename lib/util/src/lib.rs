//! Shared utilities used throughout the agent workspace: configuration and
//! state file loading, host fact discovery, and logging presets.

pub mod config;
pub mod facts;
pub mod logging;
pub mod state;
