//! Cooperative tick loop implementing [`mxremote_session::RunLoop`].
//!
//! [`TickLoop`] runs on whichever thread calls [`RunLoop::run`]. Each iteration
//! drains the scheduled callbacks in submission order, invokes the optional
//! iteration hook, then idles for at most the refresh period or until new work
//! or a leave request arrives.

mod tick;

pub use tick::{IterationHook, LoopError, TickLoop};
