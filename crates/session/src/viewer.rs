/// Domain object hosted by a session's worker thread.
///
/// The worker is the only creator and final owner of the viewer. Callers see
/// it only through work scheduled with [`Session::enqueue`](crate::Session::enqueue).
pub trait Viewer: Send + Sync + Sized + 'static {
	type Options: Clone + Send + Sync + 'static;

	/// Builds a viewer from `options`. Runs on the worker thread after the loop
	/// environment has been initialized.
	fn construct(options: &Self::Options) -> anyhow::Result<Self>;

	/// One-time setup, including the headless/visibility policy.
	fn initialize(&mut self) -> anyhow::Result<()>;

	/// Asks the viewer to wind down. Called from inside the loop.
	fn request_exit(&self);
}
