use std::time::Duration;

/// Callback executed inside the loop's own execution context.
pub type LoopTask = Box<dyn FnOnce() + Send + 'static>;

/// Execution environment hosting the blocking render loop.
///
/// A session calls [`init`](Self::init), [`run`](Self::run) and
/// [`shutdown`](Self::shutdown) only from its worker thread. The remaining
/// methods are called from arbitrary threads.
pub trait RunLoop: Send + Sync + 'static {
	/// Prepares the environment. Paired with exactly one [`shutdown`](Self::shutdown).
	fn init(&self) -> anyhow::Result<()>;

	/// Blocks, running iterations at most `refresh` apart, until [`leave`](Self::leave)
	/// is requested.
	///
	/// A leave requested after `init` but before `run` makes `run` return
	/// without iterating.
	fn run(&self, refresh: Duration) -> anyhow::Result<()>;

	/// Reports whether a thread is currently inside [`run`](Self::run).
	fn is_active(&self) -> bool;

	/// Queues `task` to run inside the loop. Tasks run one at a time in
	/// submission order. Tasks still queued when the environment shuts down are
	/// dropped without running.
	fn schedule(&self, task: LoopTask);

	/// Requests that [`run`](Self::run) return.
	fn leave(&self);

	/// Tears down what [`init`](Self::init) prepared.
	fn shutdown(&self);
}
