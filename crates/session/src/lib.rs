//! Lifecycle management for a render loop hosted on a dedicated worker thread.
//!
//! A [`Session`] owns one worker thread at a time. The worker initializes the
//! injected [`RunLoop`], constructs the [`Viewer`] domain object, signals the
//! caller blocked in [`Session::start`], and then blocks inside the loop until
//! [`Session::stop`] asks it to leave.
//!
//! ```text
//! caller                         worker thread
//! ──────                         ─────────────
//! start() ── spawn ───────────►  init loop
//!    │                           construct + initialize viewer
//!    │                           publish viewer, state = Running
//!    ◄──────── startup ready ──  run loop (blocking)
//! enqueue(f) ── schedule ─────►    f(&viewer) ──► WorkHandle
//! stop() ───── schedule exit ─►    viewer.request_exit(); leave
//!    │                           shutdown loop, state = Idle
//!    ◄──────────────── join ───  exit
//! ```
//!
//! Faults are always transported as values: startup faults through the
//! one-shot startup channel, work faults through the item's [`WorkHandle`],
//! and loop faults through [`Session::take_runtime_error`].

mod config;
mod error;
mod panic;
mod run_loop;
mod session;
mod startup;
mod viewer;
mod work;
mod worker;

pub use config::{DEFAULT_REFRESH_PERIOD, SessionConfig};
pub use error::{SessionError, WorkError};
pub use run_loop::{LoopTask, RunLoop};
pub use session::{Session, SessionState};
pub use viewer::Viewer;
pub use work::WorkHandle;
