//! Remote viewer hosted on an [`mxremote_session::Session`] worker.
//!
//! The viewer itself does no rendering here; it resolves its options against
//! the default asset set, validates them, and tracks the visibility and exit
//! state the session drives.

mod options;
mod viewer;

pub use options::{
	DEFAULT_ENV_RADIANCE, DEFAULT_LIBRARY_FOLDER, DEFAULT_MATERIAL, DEFAULT_MESH, DEFAULT_SCREEN_COLOR, SEARCH_PATH_ENV, ViewerError, ViewerOptions,
	default_search_path,
};
pub use viewer::{RemoteViewer, ViewerStatus};
