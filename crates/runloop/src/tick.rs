use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use mxremote_session::{LoopTask, RunLoop};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// Per-iteration callback, given the index of the iteration that just ran.
pub type IterationHook = Box<dyn FnMut(u64) + Send + 'static>;

/// Misuse of the loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoopError {
	#[error("tick loop is already initialized")]
	AlreadyInitialized,
	#[error("tick loop is not initialized")]
	NotInitialized,
	#[error("tick loop is already running on another thread")]
	AlreadyRunning,
}

#[derive(Default)]
struct LoopState {
	initialized: bool,
	running: bool,
	leave_requested: bool,
	queue: VecDeque<LoopTask>,
}

/// Single-threaded cooperative loop with a cross-thread callback queue.
///
/// Only one thread can be inside [`RunLoop::run`] at a time, and only one
/// session can hold the loop initialized at a time.
#[derive(Default)]
pub struct TickLoop {
	state: Mutex<LoopState>,
	wake: Condvar,
	active: AtomicBool,
	iterations: AtomicU64,
	hook: Mutex<Option<IterationHook>>,
}

impl TickLoop {
	pub fn new() -> Self {
		Self::default()
	}

	/// Installs a callback invoked once per iteration, after scheduled callbacks ran.
	#[must_use]
	pub fn with_iteration_hook(self, hook: impl FnMut(u64) + Send + 'static) -> Self {
		self.set_iteration_hook(hook);
		self
	}

	/// Replaces the per-iteration callback, taking effect from the next iteration.
	///
	/// May be called from inside the hook itself.
	pub fn set_iteration_hook(&self, hook: impl FnMut(u64) + Send + 'static) {
		*self.hook.lock() = Some(Box::new(hook));
	}

	/// Total iterations completed across all runs.
	pub fn iterations(&self) -> u64 {
		self.iterations.load(Ordering::Relaxed)
	}

	/// Number of callbacks waiting to run.
	pub fn pending(&self) -> usize {
		self.state.lock().queue.len()
	}

	/// Pops the next callback, or `None` when the queue is empty or a leave
	/// was requested.
	fn next_task(&self) -> Result<Option<LoopTask>, Leave> {
		let mut state = self.state.lock();
		if state.leave_requested {
			return Err(Leave);
		}
		Ok(state.queue.pop_front())
	}
}

struct Leave;

/// Marks the loop active for the lifetime of one `run` call, including unwinds.
struct ActiveGuard<'a> {
	owner: &'a TickLoop,
}

impl<'a> ActiveGuard<'a> {
	fn enter(owner: &'a TickLoop) -> Self {
		owner.active.store(true, Ordering::Release);
		Self { owner }
	}
}

impl Drop for ActiveGuard<'_> {
	fn drop(&mut self) {
		self.owner.active.store(false, Ordering::Release);
		self.owner.state.lock().running = false;
	}
}

impl RunLoop for TickLoop {
	fn init(&self) -> anyhow::Result<()> {
		let stale = {
			let mut state = self.state.lock();
			if state.initialized {
				return Err(LoopError::AlreadyInitialized.into());
			}
			state.initialized = true;
			state.leave_requested = false;
			std::mem::take(&mut state.queue)
		};
		if !stale.is_empty() {
			tracing::debug!(count = stale.len(), "tick loop discarding callbacks scheduled before init");
		}
		tracing::trace!("tick loop initialized");
		Ok(())
	}

	fn run(&self, refresh: Duration) -> anyhow::Result<()> {
		{
			let mut state = self.state.lock();
			if !state.initialized {
				return Err(LoopError::NotInitialized.into());
			}
			if state.running {
				return Err(LoopError::AlreadyRunning.into());
			}
			state.running = true;
		}
		let _active = ActiveGuard::enter(self);
		tracing::debug!(?refresh, "tick loop running");

		loop {
			loop {
				match self.next_task() {
					Err(Leave) => {
						tracing::debug!(iterations = self.iterations(), "tick loop leaving");
						return Ok(());
					}
					Ok(Some(task)) => task(),
					Ok(None) => break,
				}
			}

			let iteration = self.iterations.fetch_add(1, Ordering::Relaxed);
			// The hook runs unlocked so it can call back into the loop.
			let hook = self.hook.lock().take();
			if let Some(mut hook) = hook {
				hook(iteration);
				let mut slot = self.hook.lock();
				// A hook installed from inside the call wins.
				if slot.is_none() {
					*slot = Some(hook);
				}
			}

			let mut state = self.state.lock();
			if !state.leave_requested && state.queue.is_empty() {
				self.wake.wait_for(&mut state, refresh);
			}
		}
	}

	fn is_active(&self) -> bool {
		self.active.load(Ordering::Acquire)
	}

	fn schedule(&self, task: LoopTask) {
		self.state.lock().queue.push_back(task);
		self.wake.notify_one();
	}

	fn leave(&self) {
		self.state.lock().leave_requested = true;
		self.wake.notify_one();
	}

	fn shutdown(&self) {
		let dropped = {
			let mut state = self.state.lock();
			state.initialized = false;
			state.leave_requested = false;
			std::mem::take(&mut state.queue)
		};
		if !dropped.is_empty() {
			tracing::debug!(count = dropped.len(), "tick loop dropping unrun callbacks");
		}
		tracing::trace!("tick loop shut down");
	}
}
