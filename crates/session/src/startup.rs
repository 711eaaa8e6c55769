//! One-shot startup handshake from the worker thread to the thread blocked in
//! [`Session::start`](crate::Session::start).
//!
//! Both halves are single-use: resolving consumes the sender and receiving
//! consumes the receiver. A sender dropped unresolved reads as a worker that
//! exited before reporting.

use anyhow::anyhow;
use tokio::sync::oneshot;

/// Creates a fresh, unresolved startup channel.
pub(crate) fn channel() -> (StartupSender, StartupReceiver) {
	let (tx, rx) = oneshot::channel();
	(StartupSender { tx }, StartupReceiver { rx })
}

/// Producing half, owned by the worker thread.
pub(crate) struct StartupSender {
	tx: oneshot::Sender<anyhow::Result<()>>,
}

impl StartupSender {
	/// Reports that the session is running.
	pub fn ready(self) {
		self.settle(Ok(()));
	}

	/// Reports a startup fault.
	pub fn fail(self, cause: anyhow::Error) {
		self.settle(Err(cause));
	}

	fn settle(self, outcome: anyhow::Result<()>) {
		if self.tx.send(outcome).is_err() {
			tracing::trace!("startup receiver gone before the handshake settled");
		}
	}
}

/// Consuming half, owned by the `start` caller.
pub(crate) struct StartupReceiver {
	rx: oneshot::Receiver<anyhow::Result<()>>,
}

impl StartupReceiver {
	/// Blocks until the worker reports, then returns its outcome.
	///
	/// # Panics
	///
	/// Panics when called from within an asynchronous execution context.
	pub fn recv(self) -> anyhow::Result<()> {
		self.rx
			.blocking_recv()
			.unwrap_or_else(|_| Err(anyhow!("session worker exited before reporting startup")))
	}
}

#[cfg(test)]
mod tests {
	use std::thread;
	use std::time::Duration;

	use super::*;

	#[derive(Debug, thiserror::Error)]
	#[error("loop init refused")]
	struct InitRefused;

	#[test]
	fn ready_resolves_ok() {
		let (tx, rx) = channel();
		tx.ready();
		assert!(rx.recv().is_ok());
	}

	#[test]
	fn fail_delivers_original_error() {
		let (tx, rx) = channel();
		tx.fail(InitRefused.into());
		let err = rx.recv().unwrap_err();
		assert!(err.downcast_ref::<InitRefused>().is_some(), "unexpected error: {err:#}");
	}

	#[test]
	fn dropped_sender_reports_abandoned() {
		let (tx, rx) = channel();
		drop(tx);
		let err = rx.recv().unwrap_err();
		assert!(err.to_string().contains("before reporting startup"), "got: {err}");
	}

	#[test]
	fn resolving_after_receiver_dropped_is_silent() {
		let (tx, rx) = channel();
		drop(rx);
		tx.fail(InitRefused.into());
	}

	#[test]
	fn recv_blocks_until_resolved_from_another_thread() {
		let (tx, rx) = channel();
		let producer = thread::spawn(move || {
			thread::sleep(Duration::from_millis(20));
			tx.ready();
		});
		assert!(rx.recv().is_ok());
		producer.join().unwrap();
	}
}
