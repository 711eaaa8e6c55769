use std::sync::atomic::{AtomicBool, Ordering};

use mxremote_session::Viewer;

use crate::options::ViewerOptions;

/// Material viewer driven remotely through a session.
///
/// Visibility and the exit request are atomics so that work running inside
/// the loop can inspect and toggle them through a shared reference.
#[derive(Debug)]
pub struct RemoteViewer {
	options: ViewerOptions,
	visible: AtomicBool,
	initialized: bool,
	exit_requested: AtomicBool,
}

impl RemoteViewer {
	/// Options after default resolution.
	pub fn options(&self) -> &ViewerOptions {
		&self.options
	}

	pub fn is_headless(&self) -> bool {
		self.options.headless
	}

	pub fn is_visible(&self) -> bool {
		self.visible.load(Ordering::Acquire)
	}

	pub fn set_visible(&self, visible: bool) {
		if self.visible.swap(visible, Ordering::AcqRel) != visible {
			tracing::debug!(visible, "viewer visibility changed");
		}
	}

	pub fn is_initialized(&self) -> bool {
		self.initialized
	}

	pub fn exit_requested(&self) -> bool {
		self.exit_requested.load(Ordering::Acquire)
	}

	pub fn status(&self) -> ViewerStatus {
		ViewerStatus {
			material: self.options.material.display().to_string(),
			mesh: self.options.mesh.display().to_string(),
			headless: self.is_headless(),
			visible: self.is_visible(),
			screen: (self.options.screen_width, self.options.screen_height),
		}
	}
}

impl Viewer for RemoteViewer {
	type Options = ViewerOptions;

	fn construct(options: &Self::Options) -> anyhow::Result<Self> {
		let options = options.resolved();
		options.validate()?;
		tracing::debug!(
			material = %options.material.display(),
			mesh = %options.mesh.display(),
			headless = options.headless,
			"constructing remote viewer"
		);
		// Headless viewers never show, not even before initialization.
		let visible = AtomicBool::new(!options.headless);
		Ok(Self {
			options,
			visible,
			initialized: false,
			exit_requested: AtomicBool::new(false),
		})
	}

	fn initialize(&mut self) -> anyhow::Result<()> {
		self.initialized = true;
		self.set_visible(!self.options.headless);
		tracing::debug!(visible = self.is_visible(), "remote viewer initialized");
		Ok(())
	}

	fn request_exit(&self) {
		self.exit_requested.store(true, Ordering::Release);
		tracing::debug!("remote viewer exit requested");
	}
}

/// Snapshot of the viewer's presentation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerStatus {
	pub material: String,
	pub mesh: String,
	pub headless: bool,
	pub visible: bool,
	pub screen: (u32, u32),
}
