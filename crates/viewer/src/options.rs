use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_MATERIAL: &str = "resources/Materials/Examples/StandardSurface/standard_surface_default.mtlx";
pub const DEFAULT_MESH: &str = "resources/Geometry/shaderball.glb";
pub const DEFAULT_ENV_RADIANCE: &str = "resources/Lights/san_giuseppe_bridge_split.hdr";
pub const DEFAULT_LIBRARY_FOLDER: &str = "libraries";
/// Linear sRGB background used when no screen color is configured.
pub const DEFAULT_SCREEN_COLOR: [f32; 3] = [0.3, 0.3, 0.32];
/// Environment variable holding the default data search path.
pub const SEARCH_PATH_ENV: &str = "MATERIALX_SEARCH_PATH";

/// Invalid viewer options.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
	#[error("screen size must be non-zero, got {width}x{height}")]
	ZeroScreenSize { width: u32, height: u32 },
	#[error("screen color components must be within 0..=1, got {0:?}")]
	InvalidScreenColor([f32; 3]),
}

/// Construction options for a [`RemoteViewer`](crate::RemoteViewer).
///
/// Empty paths and empty lists mean "use the default"; see
/// [`ViewerOptions::resolved`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerOptions {
	pub material: PathBuf,
	pub mesh: PathBuf,
	pub env_radiance: PathBuf,
	pub search_path: Vec<PathBuf>,
	pub library_folders: Vec<PathBuf>,
	pub screen_width: u32,
	pub screen_height: u32,
	pub screen_color: [f32; 3],
	/// Suppresses visible presentation of the viewer.
	pub headless: bool,
}

impl Default for ViewerOptions {
	fn default() -> Self {
		Self {
			material: PathBuf::new(),
			mesh: PathBuf::new(),
			env_radiance: PathBuf::new(),
			search_path: Vec::new(),
			library_folders: Vec::new(),
			screen_width: 1280,
			screen_height: 960,
			screen_color: DEFAULT_SCREEN_COLOR,
			headless: true,
		}
	}
}

impl ViewerOptions {
	/// Returns a copy with every unset path filled in from the defaults.
	pub fn resolved(&self) -> Self {
		let mut resolved = self.clone();
		fill_path(&mut resolved.material, DEFAULT_MATERIAL);
		fill_path(&mut resolved.mesh, DEFAULT_MESH);
		fill_path(&mut resolved.env_radiance, DEFAULT_ENV_RADIANCE);
		if resolved.search_path.is_empty() {
			resolved.search_path = default_search_path();
		}
		if resolved.library_folders.is_empty() {
			resolved.library_folders = vec![PathBuf::from(DEFAULT_LIBRARY_FOLDER)];
		}
		resolved
	}

	pub fn validate(&self) -> Result<(), ViewerError> {
		if self.screen_width == 0 || self.screen_height == 0 {
			return Err(ViewerError::ZeroScreenSize {
				width: self.screen_width,
				height: self.screen_height,
			});
		}
		if !self.screen_color.iter().all(|c| (0.0..=1.0).contains(c)) {
			return Err(ViewerError::InvalidScreenColor(self.screen_color));
		}
		Ok(())
	}
}

fn fill_path(path: &mut PathBuf, default: &str) {
	if path.as_os_str().is_empty() {
		*path = PathBuf::from(default);
	}
}

/// Data search path from [`SEARCH_PATH_ENV`], or the current directory.
pub fn default_search_path() -> Vec<PathBuf> {
	search_path_from(env::var_os(SEARCH_PATH_ENV).as_deref().map(Path::new))
}

fn search_path_from(value: Option<&Path>) -> Vec<PathBuf> {
	let paths: Vec<PathBuf> = value
		.map(|v| env::split_paths(v.as_os_str()).filter(|p| !p.as_os_str().is_empty()).collect())
		.unwrap_or_default();
	if paths.is_empty() { vec![PathBuf::from(".")] } else { paths }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_fill_empty_paths() {
		let resolved = ViewerOptions::default().resolved();
		assert_eq!(resolved.material, PathBuf::from(DEFAULT_MATERIAL));
		assert_eq!(resolved.mesh, PathBuf::from(DEFAULT_MESH));
		assert_eq!(resolved.env_radiance, PathBuf::from(DEFAULT_ENV_RADIANCE));
		assert_eq!(resolved.library_folders, vec![PathBuf::from(DEFAULT_LIBRARY_FOLDER)]);
		assert!(!resolved.search_path.is_empty());
		assert!(resolved.headless);
	}

	#[test]
	fn explicit_paths_are_kept() {
		let options = ViewerOptions {
			material: PathBuf::from("materials/brass.mtlx"),
			library_folders: vec![PathBuf::from("libs"), PathBuf::from("extra")],
			..ViewerOptions::default()
		};
		let resolved = options.resolved();
		assert_eq!(resolved.material, PathBuf::from("materials/brass.mtlx"));
		assert_eq!(resolved.library_folders, vec![PathBuf::from("libs"), PathBuf::from("extra")]);
		assert_eq!(resolved.mesh, PathBuf::from(DEFAULT_MESH));
	}

	#[test]
	fn search_path_parses_platform_list() {
		let joined = env::join_paths(["/opt/materialx", "/usr/share/materialx"]).unwrap();
		let paths = search_path_from(Some(Path::new(&joined)));
		assert_eq!(paths, vec![PathBuf::from("/opt/materialx"), PathBuf::from("/usr/share/materialx")]);
	}

	#[test]
	fn search_path_falls_back_to_current_dir() {
		assert_eq!(search_path_from(None), vec![PathBuf::from(".")]);
		assert_eq!(search_path_from(Some(Path::new(""))), vec![PathBuf::from(".")]);
	}

	#[test]
	fn validate_rejects_zero_screen() {
		let options = ViewerOptions {
			screen_height: 0,
			..ViewerOptions::default()
		};
		assert_eq!(options.validate(), Err(ViewerError::ZeroScreenSize { width: 1280, height: 0 }));
	}

	#[test]
	fn validate_rejects_out_of_range_color() {
		let options = ViewerOptions {
			screen_color: [0.2, f32::NAN, 0.1],
			..ViewerOptions::default()
		};
		assert!(matches!(options.validate(), Err(ViewerError::InvalidScreenColor(_))));
	}

	#[test]
	fn deserializes_partial_table() {
		let options: ViewerOptions = toml::from_str(
			r#"
			mesh = "geometry/teapot.glb"
			headless = false
			screen_width = 640
			"#,
		)
		.unwrap();
		assert_eq!(options.mesh, PathBuf::from("geometry/teapot.glb"));
		assert!(!options.headless);
		assert_eq!(options.screen_width, 640);
		assert_eq!(options.screen_height, 960);
		assert!(options.material.as_os_str().is_empty());
	}

	#[test]
	fn rejects_unknown_fields() {
		assert!(toml::from_str::<ViewerOptions>("fullscreen = true").is_err());
	}
}
