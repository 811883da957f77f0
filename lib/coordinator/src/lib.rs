//! Thin request/response wrapper around the coordinator's HTTP API:
//! bounded timeout, JSON body contract, and error classification. DNS,
//! socket, timeout and HTTP >= 400 failures are all local to this client,
//! logged and turned into `None`, never propagated to the supervisor.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A directive returned by the coordinator in a heartbeat response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatDirective {
	/// Nothing to do this tick.
	None,
	/// Start the named job.
	Run(String),
	/// Stop the named job.
	Kill(String),
}

/// Parse a heartbeat response body into a directive. Any shape other than
/// `{"run": id}` or `{"kill": id}` is treated as a no-op.
pub fn parse_directive(response: &Value) -> HeartbeatDirective {
	if let Some(id) = response.get("run").and_then(Value::as_str) {
		return HeartbeatDirective::Run(id.to_string());
	}
	if let Some(id) = response.get("kill").and_then(Value::as_str) {
		return HeartbeatDirective::Kill(id.to_string());
	}
	HeartbeatDirective::None
}

/// A client bound to one coordinator base URL.
pub struct CoordinatorClient {
	base_url: String,
	client: reqwest::Client,
}

impl CoordinatorClient {
	pub fn new(base_url: impl Into<String>) -> Self {
		let client = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.user_agent(format!("seot-agent {}", env!("CARGO_PKG_VERSION")))
			.build()
			.unwrap();

		Self {
			base_url: base_url.into(),
			client,
		}
	}

	/// POST the heartbeat body. Returns the coordinator's directive, or
	/// `None` on any request failure.
	pub async fn heartbeat(&self, body: &Value) -> Option<Value> {
		self.request(Method::POST, "/heartbeat", Some(body)).await
	}

	/// GET a job description.
	pub async fn get_job(&self, job_id: &str) -> Option<Value> {
		self.request(Method::GET, &format!("/job/{job_id}"), None).await
	}

	pub async fn accept_job(&self, job_id: &str) -> Option<Value> {
		self.request(Method::POST, &format!("/job/{job_id}/accept"), None)
			.await
	}

	pub async fn reject_job(&self, job_id: &str) -> Option<Value> {
		self.request(Method::POST, &format!("/job/{job_id}/reject"), None)
			.await
	}

	pub async fn stop_job(&self, job_id: &str) -> Option<Value> {
		self.request(Method::POST, &format!("/job/{job_id}/stop"), None)
			.await
	}

	/// The one operation every coordinator call is built on. Status >= 400
	/// and every connection/DNS/timeout failure are logged and turned into
	/// `None`; callers must treat `None` as "try again next tick", never
	/// as fatal.
	pub async fn request(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Option<Value> {
		let url = format!("{}{endpoint}", self.base_url);
		let mut req = self.client.request(method.clone(), &url);
		if let Some(body) = body {
			req = req.json(body);
		}

		let response = match req.send().await {
			Ok(response) => response,
			Err(err) => {
				log_send_error(&method, &url, &err);
				return None;
			}
		};

		let status = response.status();
		if status.as_u16() >= 400 {
			let text = response.text().await.unwrap_or_default();
			warn!(method = %method, url = %url, status = %status, body = %text, "coordinator request rejected");
			return None;
		}

		match response.json::<Value>().await {
			Ok(value) => Some(value),
			Err(_) => Some(Value::Object(serde_json::Map::new())),
		}
	}
}

fn log_send_error(method: &Method, url: &str, err: &reqwest::Error) {
	if err.is_timeout() {
		warn!(method = %method, url = %url, "coordinator request timed out");
	} else if err.is_connect() {
		warn!(method = %method, url = %url, error = %err, "failed to connect to coordinator");
	} else {
		warn!(method = %method, url = %url, error = %err, "coordinator request failed");
	}
}
