use std::{
	future::Future,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc, Mutex,
	},
};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::errors::{NodeError, NodeRuntimeError};

/// The work-task lifecycle shared by every concrete node: idempotent
/// start/stop, a `running` flag, and a cancellation token a node's work
/// loop observes cooperatively.
///
/// A node holds one `TaskHandle` and implements `start`/`stop`/`running`/
/// `join` by delegating to it.
pub struct TaskHandle {
	running: Arc<AtomicBool>,
	cancel: CancellationToken,
	done: Arc<Notify>,
	result: Arc<Mutex<Option<Result<(), NodeRuntimeError>>>>,
}

impl Default for TaskHandle {
	fn default() -> Self {
		Self::new()
	}
}

impl TaskHandle {
	pub fn new() -> Self {
		Self {
			running: Arc::new(AtomicBool::new(false)),
			cancel: CancellationToken::new(),
			done: Arc::new(Notify::new()),
			result: Arc::new(Mutex::new(Some(Ok(())))),
		}
	}

	pub fn running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	/// The token a node's work loop should observe to notice `stop()`.
	pub fn cancellation_token(&self) -> CancellationToken {
		self.cancel.clone()
	}

	/// Spawn `work` as this node's task. Fails with `AlreadyRunning` if a
	/// previous task is still running.
	pub fn spawn<F>(&self, work: F) -> Result<(), NodeError>
	where
		F: Future<Output = Result<(), NodeRuntimeError>> + Send + 'static,
	{
		if self.running.swap(true, Ordering::SeqCst) {
			return Err(NodeError::AlreadyRunning);
		}

		*self.result.lock().unwrap_or_else(|e| e.into_inner()) = None;

		let running = self.running.clone();
		let done = self.done.clone();
		let result = self.result.clone();

		tokio::spawn(async move {
			let outcome = work.await;
			*result.lock().unwrap_or_else(|e| e.into_inner()) = Some(outcome);
			running.store(false, Ordering::SeqCst);
			done.notify_waiters();
		});

		Ok(())
	}

	/// Request cooperative cancellation. Fails with `NotRunning` if the
	/// task is not currently running.
	pub fn request_stop(&self) -> Result<(), NodeError> {
		if !self.running() {
			return Err(NodeError::NotRunning);
		}
		self.cancel.cancel();
		Ok(())
	}

	/// Await the task's outcome. Resolves immediately if the task has
	/// already finished (or never ran).
	pub async fn join(&self) -> Result<(), NodeRuntimeError> {
		loop {
			let notified = self.done.notified();
			if let Some(result) = self.result.lock().unwrap_or_else(|e| e.into_inner()).clone() {
				return result;
			}
			notified.await;
		}
	}
}
