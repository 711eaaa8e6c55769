//! Session configuration file loading and command line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mxremote_session::SessionConfig;
use mxremote_viewer::ViewerOptions;
use thiserror::Error;

/// Errors that can occur while assembling the session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading the configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing the configuration file.
	#[error("failed to parse {path}: {error}")]
	Parse {
		path: PathBuf,
		error: toml::de::Error,
	},

	/// A refresh period given on the command line was not a positive number.
	#[error("invalid refresh period: {0} ms (expected a positive number)")]
	InvalidRefresh(f64),
}

pub type Config = SessionConfig<ViewerOptions>;

/// Reads the configuration at `path`, or the defaults when no path is given.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
	let Some(path) = path else {
		return Ok(Config::default());
	};
	let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
		path: path.to_path_buf(),
		error,
	})?;
	let config = toml::from_str(&text).map_err(|error| ConfigError::Parse {
		path: path.to_path_buf(),
		error,
	})?;
	tracing::debug!(path = %path.display(), "loaded session config");
	Ok(config)
}

/// Command line settings that take precedence over the configuration file.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct Overrides {
	/// Material document to display
	#[arg(long, value_name = "PATH")]
	pub material: Option<PathBuf>,

	/// Mesh to display the material on
	#[arg(long, value_name = "PATH")]
	pub mesh: Option<PathBuf>,

	/// Environment radiance map
	#[arg(long = "env", value_name = "PATH")]
	pub env_radiance: Option<PathBuf>,

	/// Show the viewer instead of running headless
	#[arg(long)]
	pub show: bool,

	/// Render loop refresh period in milliseconds
	#[arg(long, value_name = "MS")]
	pub refresh_ms: Option<f64>,
}

impl Overrides {
	pub fn apply(&self, mut config: Config) -> Result<Config, ConfigError> {
		if let Some(material) = &self.material {
			config.viewer.material = material.clone();
		}
		if let Some(mesh) = &self.mesh {
			config.viewer.mesh = mesh.clone();
		}
		if let Some(env_radiance) = &self.env_radiance {
			config.viewer.env_radiance = env_radiance.clone();
		}
		if self.show {
			config.viewer.headless = false;
		}
		if let Some(ms) = self.refresh_ms {
			if !ms.is_finite() || ms <= 0.0 {
				return Err(ConfigError::InvalidRefresh(ms));
			}
			let refresh = Duration::try_from_secs_f64(ms / 1000.0).map_err(|_| ConfigError::InvalidRefresh(ms))?;
			config = config.with_refresh_period(refresh);
		}
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use mxremote_session::DEFAULT_REFRESH_PERIOD;

	use super::*;

	#[test]
	fn missing_path_yields_defaults() {
		let config = load(None).unwrap();
		assert_eq!(config.refresh_period, DEFAULT_REFRESH_PERIOD);
		assert_eq!(config.viewer, ViewerOptions::default());
	}

	#[test]
	fn loads_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("mxremote.toml");
		std::fs::write(
			&path,
			"refresh_period_ms = 33\n\n[viewer]\nheadless = false\nmesh = \"geometry/sphere.obj\"\n",
		)
		.unwrap();

		let config = load(Some(&path)).unwrap();
		assert_eq!(config.refresh_period, Duration::from_millis(33));
		assert!(!config.viewer.headless);
		assert_eq!(config.viewer.mesh, PathBuf::from("geometry/sphere.obj"));
	}

	#[test]
	fn unreadable_file_reports_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("absent.toml");
		let err = load(Some(&path)).unwrap_err();
		assert!(matches!(&err, ConfigError::Io { path: p, .. } if *p == path));
		assert!(err.to_string().contains("absent.toml"));
	}

	#[test]
	fn malformed_file_is_a_parse_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("broken.toml");
		std::fs::write(&path, "[viewer]\nscreen_width = \"wide\"\n").unwrap();
		assert!(matches!(load(Some(&path)), Err(ConfigError::Parse { .. })));
	}

	#[test]
	fn overrides_take_precedence() {
		let overrides = Overrides {
			material: Some(PathBuf::from("materials/copper.mtlx")),
			show: true,
			refresh_ms: Some(4.0),
			..Overrides::default()
		};
		let config = overrides.apply(Config::default()).unwrap();
		assert_eq!(config.viewer.material, PathBuf::from("materials/copper.mtlx"));
		assert!(!config.viewer.headless);
		assert_eq!(config.refresh_period, Duration::from_millis(4));
		assert!(config.viewer.mesh.as_os_str().is_empty(), "unset overrides leave defaults to the viewer");
	}

	#[test]
	fn rejects_non_positive_refresh() {
		for ms in [0.0, -1.0, f64::NAN] {
			let overrides = Overrides {
				refresh_ms: Some(ms),
				..Overrides::default()
			};
			assert!(matches!(overrides.apply(Config::default()), Err(ConfigError::InvalidRefresh(_))));
		}
	}
}
