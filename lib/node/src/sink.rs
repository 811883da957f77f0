use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::{envelope::Envelope, errors::NodeRuntimeError};

enum Sender {
	Bounded(mpsc::Sender<Envelope>),
	Unbounded(mpsc::UnboundedSender<Envelope>),
}

/// The receiving half of a sink's queue, owned by its work task.
pub enum Receiver {
	Bounded(mpsc::Receiver<Envelope>),
	Unbounded(mpsc::UnboundedReceiver<Envelope>),
}

impl Receiver {
	/// Dequeue the next envelope, suspending until one is available or the
	/// queue is closed (all senders dropped).
	pub async fn recv(&mut self) -> Option<Envelope> {
		match self {
			Self::Bounded(rx) => rx.recv().await,
			Self::Unbounded(rx) => rx.recv().await,
		}
	}
}

/// Shared state backing every sink-capable node: a FIFO queue of pending
/// envelopes. `capacity: None` yields an unbounded queue (the default);
/// `capacity: Some(n)` makes `write()` suspend once `n` envelopes are
/// queued, giving the upstream source backpressure.
pub struct SinkBase {
	tx: Sender,
	rx: Mutex<Option<Receiver>>,
}

impl SinkBase {
	pub fn new(capacity: Option<usize>) -> Self {
		match capacity {
			Some(n) => {
				let (tx, rx) = mpsc::channel(n.max(1));
				Self {
					tx: Sender::Bounded(tx),
					rx: Mutex::new(Some(Receiver::Bounded(rx))),
				}
			}
			None => {
				let (tx, rx) = mpsc::unbounded_channel();
				Self {
					tx: Sender::Unbounded(tx),
					rx: Mutex::new(Some(Receiver::Unbounded(rx))),
				}
			}
		}
	}

	/// Enqueue an envelope, suspending the caller if a bounded queue is
	/// full.
	pub async fn write(&self, envelope: Envelope) -> Result<(), NodeRuntimeError> {
		match &self.tx {
			Sender::Bounded(tx) => tx
				.send(envelope)
				.await
				.map_err(|_| NodeRuntimeError::other(anyhow::anyhow!("sink queue is closed"))),
			Sender::Unbounded(tx) => tx
				.send(envelope)
				.map_err(|_| NodeRuntimeError::other(anyhow::anyhow!("sink queue is closed"))),
		}
	}

	/// Take ownership of the receiving half, for the work task to poll.
	/// Returns `None` if the work task has already taken it (the node's
	/// `start()` is not idempotent at this layer; the `Node` impl is
	/// responsible for rejecting a second `start()`).
	pub fn take_receiver(&self) -> Option<Receiver> {
		self.rx.lock().unwrap_or_else(|e| e.into_inner()).take()
	}

	/// Return the receiver once the work task is done with it, so a
	/// re-`start()` is impossible to observe as a fresh, empty queue.
	pub fn return_receiver(&self, rx: Receiver) {
		*self.rx.lock().unwrap_or_else(|e| e.into_inner()) = Some(rx);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::Value;

	#[tokio::test]
	async fn unbounded_write_never_suspends() {
		let sink = SinkBase::new(None);
		for i in 0..100 {
			let mut env = Envelope::new();
			env.insert("i".into(), Value::from(i));
			sink.write(env).await.unwrap();
		}

		let mut rx = sink.take_receiver().unwrap();
		let first = rx.recv().await.unwrap();
		assert_eq!(first["i"], Value::from(0));
	}

	#[tokio::test]
	async fn bounded_write_suspends_when_full() {
		let sink = SinkBase::new(Some(1));
		sink.write(Envelope::new()).await.unwrap();

		let mut rx = sink.take_receiver().unwrap();
		let fut = sink.write(Envelope::new());
		tokio::pin!(fut);

		// The queue is full; the second write must not complete until we drain it.
		assert!(futures::poll!(&mut fut).is_pending());
		rx.recv().await.unwrap();
		fut.await.unwrap();
	}
}
