//! Host metadata included verbatim in every heartbeat.

use std::collections::BTreeMap;

/// Compute this process's `facts`, attached once to the agent
/// configuration and sent with every heartbeat.
///
/// This never fails: every field falls back to a placeholder if the
/// underlying lookup is unavailable.
pub fn discover_facts() -> BTreeMap<String, String> {
	let mut facts = BTreeMap::new();

	facts.insert("agent_version".into(), env!("CARGO_PKG_VERSION").into());
	facts.insert("arch".into(), std::env::consts::ARCH.into());
	facts.insert("os".into(), std::env::consts::OS.into());
	facts.insert("runtime".into(), "tokio".into());
	facts.insert("kernel".into(), whoami::distro());
	facts.insert(
		"processor".into(),
		format!(
			"{} ({} logical cores)",
			std::env::consts::ARCH,
			std::thread::available_parallelism().map_or(1, |n| n.get())
		),
	);
	facts.insert("user".into(), whoami::username());
	facts.insert("hostname".into(), whoami::hostname());
	facts.insert("ip".into(), local_ip().unwrap_or_else(|| "unknown".into()));

	facts
}

/// Best-effort discovery of a local (non-loopback) IP address, by
/// opening a UDP socket toward a public address without sending anything.
fn local_ip() -> Option<String> {
	let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
	socket.connect("8.8.8.8:80").ok()?;
	socket.local_addr().ok().map(|addr| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn discovers_all_expected_keys() {
		let facts = discover_facts();
		for key in [
			"agent_version",
			"arch",
			"processor",
			"runtime",
			"kernel",
			"os",
			"user",
			"ip",
			"hostname",
		] {
			assert!(facts.contains_key(key), "missing fact {key}");
		}
	}
}
