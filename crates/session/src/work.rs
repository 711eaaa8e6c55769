use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::WorkError;
use crate::panic::panic_message;
use crate::run_loop::LoopTask;

/// Handle to the eventual result of work scheduled with
/// [`Session::enqueue`](crate::Session::enqueue).
///
/// Resolves exactly once. Await it from async code, or call
/// [`wait`](Self::wait) from a plain thread.
#[must_use = "dropping a WorkHandle discards the work result"]
#[derive(Debug)]
pub struct WorkHandle<R> {
	rx: oneshot::Receiver<Result<R, WorkError>>,
}

impl<R> WorkHandle<R> {
	/// Blocks the current thread until the work item completes.
	///
	/// # Panics
	///
	/// Panics when called from within an asynchronous execution context; await
	/// the handle there instead.
	pub fn wait(self) -> Result<R, WorkError> {
		self.rx.blocking_recv().unwrap_or_else(|_| Err(WorkError::Dropped))
	}

	/// Returns the result if the work item already completed.
	///
	/// Once a result has been taken, later calls report [`WorkError::Dropped`].
	pub fn try_take(&mut self) -> Option<Result<R, WorkError>> {
		match self.rx.try_recv() {
			Ok(result) => Some(result),
			Err(TryRecvError::Empty) => None,
			Err(TryRecvError::Closed) => Some(Err(WorkError::Dropped)),
		}
	}
}

impl<R> Future for WorkHandle<R> {
	type Output = Result<R, WorkError>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.rx)
			.poll(cx)
			.map(|received| received.unwrap_or_else(|_| Err(WorkError::Dropped)))
	}
}

/// Wraps `work` into a loop task bound to `target`, paired with the handle
/// its outcome is delivered to.
///
/// Panics raised by `work` are caught inside the task and never unwind into
/// the loop.
pub(crate) fn work_item<T, F, R>(target: Arc<T>, work: F) -> (LoopTask, WorkHandle<R>)
where
	T: Send + Sync + 'static,
	F: FnOnce(&T) -> R + Send + 'static,
	R: Send + 'static,
{
	let (tx, rx) = oneshot::channel();
	let task: LoopTask = Box::new(move || {
		let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(target.as_ref()))).map_err(|payload| {
			let message = panic_message(&*payload);
			tracing::warn!(panic = %message, "session work item panicked");
			WorkError::Panicked(message)
		});
		if tx.send(outcome).is_err() {
			tracing::trace!("work handle dropped before completion");
		}
	});
	(task, WorkHandle { rx })
}
