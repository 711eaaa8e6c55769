//! Body of the dedicated session worker thread.

use std::sync::Arc;

use crate::panic::catch_fault;
use crate::run_loop::RunLoop;
use crate::session::{Inner, SessionState};
use crate::startup::StartupSender;
use crate::viewer::Viewer;

/// Runs one session lifetime: setup, startup report, loop, teardown.
///
/// Every fault is captured as a value. Faults before the startup report go
/// to `startup`; faults after it land in the session's runtime error slot.
/// The loop environment is shut down on every path once initialized.
pub(crate) fn run<V: Viewer>(inner: Arc<Inner<V>>, startup: StartupSender) {
	let span = tracing::info_span!("session.worker", refresh = ?inner.config.refresh_period);
	let _entered = span.enter();

	let mut loop_ready = false;
	let setup = catch_fault(|| {
		inner.run_loop.init()?;
		loop_ready = true;
		let mut viewer = V::construct(&inner.config.viewer)?;
		viewer.initialize()?;
		Ok(Arc::new(viewer))
	});

	let viewer = match setup {
		Ok(viewer) => viewer,
		Err(cause) => {
			tracing::debug!(error = %format_args!("{cause:#}"), loop_ready, "session setup failed");
			if loop_ready && let Err(err) = catch_fault(|| teardown(inner.run_loop.as_ref())) {
				tracing::error!(error = %format_args!("{err:#}"), "run loop teardown failed");
			}
			{
				let mut shared = inner.shared.lock();
				shared.viewer = None;
				shared.set_state(SessionState::Idle);
			}
			startup.fail(cause);
			return;
		}
	};

	{
		let mut shared = inner.shared.lock();
		shared.viewer = Some(Arc::clone(&viewer));
		shared.set_state(SessionState::Running);
	}
	startup.ready();

	let ran = catch_fault(|| inner.run_loop.run(inner.config.refresh_period));
	if ran.is_err() && inner.run_loop.is_active() {
		inner.run_loop.leave();
	}
	let closed = catch_fault(|| {
		inner.run_loop.shutdown();
		Ok(())
	});
	let outcome = ran.and(closed);

	{
		let mut shared = inner.shared.lock();
		shared.viewer = None;
		match shared.state {
			// The loop left on its own.
			SessionState::Running => shared.set_state(SessionState::Idle),
			// Stopped from inside the loop; nobody is joining this thread.
			SessionState::Stopping if shared.worker.is_some() => shared.set_state(SessionState::Idle),
			// A stopping caller owns the join and settles the state after it.
			_ => {}
		}
		match outcome {
			Ok(()) => shared.runtime_error = None,
			Err(err) => {
				tracing::error!(error = %format_args!("{err:#}"), "session loop failed after startup");
				shared.runtime_error = Some(err);
			}
		}
	}

	// Last reference held by the worker; the viewer is destroyed on this thread
	// unless in-flight work still borrows it.
	drop(viewer);
	tracing::debug!("session worker exiting");
}

fn teardown(run_loop: &dyn RunLoop) -> anyhow::Result<()> {
	if run_loop.is_active() {
		run_loop.leave();
	}
	run_loop.shutdown();
	Ok(())
}
