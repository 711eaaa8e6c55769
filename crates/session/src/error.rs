use thiserror::Error;

/// Errors returned by [`Session`](crate::Session) lifecycle and dispatch calls.
#[derive(Debug, Error)]
pub enum SessionError {
	/// `start` was called while the session was not idle.
	#[error("session is already running")]
	AlreadyRunning,

	/// `enqueue` was called while no viewer was live.
	#[error("session is not running")]
	NotRunning,

	/// The loop or the viewer failed before the session reported ready.
	///
	/// Carries the original fault value, so callers can downcast it.
	#[error("session startup failed")]
	Startup(#[source] anyhow::Error),

	/// The worker thread could not be spawned.
	#[error("failed to spawn session worker thread")]
	Spawn(#[source] std::io::Error),
}

impl SessionError {
	/// Returns the captured startup fault, if this is a startup failure.
	pub fn startup_cause(&self) -> Option<&anyhow::Error> {
		match self {
			Self::Startup(cause) => Some(cause),
			_ => None,
		}
	}
}

/// Failure resolved through a [`WorkHandle`](crate::WorkHandle).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkError {
	/// The work item panicked while running inside the loop.
	#[error("work item panicked: {0}")]
	Panicked(String),

	/// The loop discarded the item without running it, usually because the
	/// session stopped first.
	#[error("work item was dropped before it ran")]
	Dropped,
}
