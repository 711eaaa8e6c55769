//! Session state machine, start/stop sequencing and work dispatch.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use anyhow::anyhow;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::panic::panic_message;
use crate::run_loop::RunLoop;
use crate::startup;
use crate::viewer::Viewer;
use crate::work::{WorkHandle, work_item};
use crate::worker;


const WORKER_THREAD_NAME: &str = "mxremote-session";

/// Lifecycle phase of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
	/// No worker is running the loop.
	Idle,
	/// A worker was spawned and has not reported startup yet.
	Starting,
	/// The viewer is live and work can be enqueued.
	Running,
	/// Loop termination was requested and the worker is being joined.
	Stopping,
}

impl SessionState {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::Starting => "starting",
			Self::Running => "running",
			Self::Stopping => "stopping",
		}
	}
}

impl fmt::Display for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Everything guarded by the session lock.
pub(crate) struct Shared<V> {
	pub(crate) state: SessionState,
	/// Present iff `state` is `Running`, or momentarily while `Stopping`.
	pub(crate) viewer: Option<Arc<V>>,
	pub(crate) worker: Option<JoinHandle<()>>,
	/// Thread id of the most recently spawned worker.
	pub(crate) worker_id: Option<ThreadId>,
	pub(crate) runtime_error: Option<anyhow::Error>,
	/// Callers parked until the next state transition.
	settle_waiters: Vec<oneshot::Sender<()>>,
}

impl<V> Shared<V> {
	/// Moves to `state` and wakes every parked caller so it can re-check.
	pub(crate) fn set_state(&mut self, state: SessionState) {
		self.state = state;
		for waiter in self.settle_waiters.drain(..) {
			let _ = waiter.send(());
		}
	}

	fn park(&mut self) -> oneshot::Receiver<()> {
		let (tx, rx) = oneshot::channel();
		self.settle_waiters.push(tx);
		rx
	}
}

pub(crate) struct Inner<V: Viewer> {
	pub(crate) config: SessionConfig<V::Options>,
	pub(crate) run_loop: Arc<dyn RunLoop>,
	pub(crate) shared: Mutex<Shared<V>>,
}

/// Owner of one render loop worker thread.
///
/// All methods take `&self`; share the session behind an `Arc` to drive it
/// from several threads. No lock is held while waiting on the worker.
///
/// Dropping a session stops it.
pub struct Session<V: Viewer> {
	inner: Arc<Inner<V>>,
}

impl<V: Viewer> Session<V> {
	/// Creates an idle session. Nothing runs until [`start`](Self::start).
	pub fn new(config: SessionConfig<V::Options>, run_loop: Arc<dyn RunLoop>) -> Self {
		Self {
			inner: Arc::new(Inner {
				config,
				run_loop,
				shared: Mutex::new(Shared {
					state: SessionState::Idle,
					viewer: None,
					worker: None,
					worker_id: None,
					runtime_error: None,
					settle_waiters: Vec::new(),
				}),
			}),
		}
	}

	pub fn config(&self) -> &SessionConfig<V::Options> {
		&self.inner.config
	}

	/// Spawns the worker and blocks until the viewer is live or startup failed.
	///
	/// On failure the worker has been joined and the session is back in
	/// [`SessionState::Idle`]; the fault raised by the loop or the viewer is
	/// returned unchanged inside [`SessionError::Startup`].
	///
	/// # Panics
	///
	/// Panics when called from within an asynchronous execution context.
	pub fn start(&self) -> Result<(), SessionError> {
		let stale = {
			let mut shared = self.inner.shared.lock();
			if shared.state != SessionState::Idle {
				return Err(SessionError::AlreadyRunning);
			}
			shared.set_state(SessionState::Starting);
			shared.runtime_error = None;
			shared.worker.take()
		};
		tracing::debug!("session starting");

		// A worker that left the loop on its own is finished but not yet reaped.
		if let Some(stale) = stale {
			join_worker(&self.inner, stale);
		}

		let (sender, receiver) = startup::channel();
		let worker_id = {
			let mut shared = self.inner.shared.lock();
			let inner = Arc::clone(&self.inner);
			let spawned = thread::Builder::new()
				.name(WORKER_THREAD_NAME.into())
				.spawn(move || worker::run(inner, sender));
			match spawned {
				Ok(handle) => {
					let id = handle.thread().id();
					shared.worker = Some(handle);
					shared.worker_id = Some(id);
					id
				}
				Err(err) => {
					shared.set_state(SessionState::Idle);
					tracing::error!(error = %err, "failed to spawn session worker");
					return Err(SessionError::Spawn(err));
				}
			}
		};

		let cause = match receiver.recv() {
			Ok(()) => {
				tracing::info!("session started");
				return Ok(());
			}
			Err(cause) => cause,
		};

		let failed_worker = {
			let mut shared = self.inner.shared.lock();
			// Once the worker reported Idle, another caller may already have
			// reaped it; only a handle still in place is ours to join.
			let ours = shared.worker.as_ref().is_some_and(|handle| handle.thread().id() == worker_id);
			if ours {
				if shared.state == SessionState::Starting {
					shared.set_state(SessionState::Idle);
				}
				shared.worker.take()
			} else {
				None
			}
		};
		if let Some(worker) = failed_worker {
			join_worker(&self.inner, worker);
		}
		tracing::warn!(error = %format_args!("{cause:#}"), "session failed to start");
		Err(SessionError::Startup(cause))
	}

	/// Terminates the loop, joins the worker and returns to [`SessionState::Idle`].
	///
	/// Safe to call in any state, any number of times and from several threads
	/// at once. Every caller returns only after the worker has exited; an
	/// in-flight [`start`](Self::start) settles before it is acted on.
	///
	/// # Panics
	///
	/// Panics when called from within an asynchronous execution context while
	/// another caller is starting or stopping the session.
	pub fn stop(&self) {
		let (viewer, worker) = loop {
			let mut shared = self.inner.shared.lock();
			match shared.state {
				SessionState::Idle => {
					let stale = shared.worker.take();
					drop(shared);
					if let Some(stale) = stale {
						join_worker(&self.inner, stale);
					}
					return;
				}
				SessionState::Running | SessionState::Stopping => {
					if let Some(worker) = shared.worker.take() {
						shared.set_state(SessionState::Stopping);
						break (shared.viewer.clone(), worker);
					}
					// Parking here would wait on our own exit.
					if shared.worker_id == Some(thread::current().id()) {
						tracing::debug!("session stop from its worker while another caller joins it");
						return;
					}
				}
				SessionState::Starting => {}
			}
			let settled = shared.park();
			let state = shared.state;
			drop(shared);
			tracing::debug!(%state, "session stop waiting for state to settle");
			let _ = settled.blocking_recv();
		};

		tracing::debug!("session stopping");
		self.request_leave(viewer);

		if worker.thread().id() == thread::current().id() {
			tracing::warn!("session stopped from its own worker; deferring join");
			self.inner.shared.lock().worker = Some(worker);
			return;
		}
		join_worker(&self.inner, worker);

		let mut shared = self.inner.shared.lock();
		shared.viewer = None;
		if matches!(shared.state, SessionState::Stopping | SessionState::Idle) {
			shared.set_state(SessionState::Idle);
		}
		drop(shared);
		tracing::info!("session stopped");
	}

	/// Returns `true` while the viewer is live.
	pub fn is_running(&self) -> bool {
		self.inner.shared.lock().state == SessionState::Running
	}

	pub fn state(&self) -> SessionState {
		self.inner.shared.lock().state
	}

	/// Schedules `work` to run against the live viewer inside the loop.
	///
	/// Fails with [`SessionError::NotRunning`] without scheduling anything
	/// unless the session is running. Otherwise returns immediately; the
	/// handle resolves once the loop has run `work`. Items run in submission
	/// order.
	pub fn enqueue<F, R>(&self, work: F) -> Result<WorkHandle<R>, SessionError>
	where
		F: FnOnce(&V) -> R + Send + 'static,
		R: Send + 'static,
	{
		let viewer = {
			let shared = self.inner.shared.lock();
			match (&shared.state, &shared.viewer) {
				(SessionState::Running, Some(viewer)) => Arc::clone(viewer),
				_ => return Err(SessionError::NotRunning),
			}
		};

		let (task, handle) = work_item(viewer, work);
		self.inner.run_loop.schedule(task);
		Ok(handle)
	}

	/// Takes the fault that ended the last run after a successful start.
	///
	/// Cleared by the next [`start`](Self::start).
	pub fn take_runtime_error(&self) -> Option<anyhow::Error> {
		self.inner.shared.lock().runtime_error.take()
	}

	pub fn has_runtime_error(&self) -> bool {
		self.inner.shared.lock().runtime_error.is_some()
	}

	/// Asks the loop to return, preferring a cooperative exit from inside it.
	fn request_leave(&self, viewer: Option<Arc<V>>) {
		let run_loop = &self.inner.run_loop;
		match viewer {
			Some(viewer) if run_loop.is_active() => {
				let in_loop = Arc::clone(run_loop);
				run_loop.schedule(Box::new(move || {
					viewer.request_exit();
					in_loop.leave();
				}));
			}
			_ => run_loop.leave(),
		}
	}
}

impl<V: Viewer> fmt::Debug for Session<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let shared = self.inner.shared.lock();
		f.debug_struct("Session")
			.field("state", &shared.state)
			.field("refresh_period", &self.inner.config.refresh_period)
			.field("runtime_error", &shared.runtime_error.is_some())
			.finish_non_exhaustive()
	}
}

impl<V: Viewer> Drop for Session<V> {
	fn drop(&mut self) {
		if panic::catch_unwind(AssertUnwindSafe(|| self.stop())).is_err() {
			tracing::error!("session stop panicked during drop");
		}
	}
}

/// Joins `handle`, recording a worker panic as the session's runtime error.
fn join_worker<V: Viewer>(inner: &Inner<V>, handle: JoinHandle<()>) {
	if let Err(payload) = handle.join() {
		let message = panic_message(&*payload);
		tracing::error!(panic = %message, "session worker panicked");
		inner.shared.lock().runtime_error = Some(anyhow!("session worker panicked: {message}"));
	}
}
