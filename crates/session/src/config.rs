use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Refresh period used when none is configured (roughly 60 iterations per second).
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_millis(16);

/// Static configuration for one [`Session`](crate::Session).
///
/// Deserializes from a table shaped like:
///
/// ```toml
/// refresh_period_ms = 16.0
///
/// [viewer]
/// # viewer options
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, bound(deserialize = "O: Deserialize<'de> + Default"))]
pub struct SessionConfig<O> {
	/// Options handed to [`Viewer::construct`](crate::Viewer::construct) on the worker thread.
	pub viewer: O,
	/// Upper bound on how long the loop idles between iterations.
	#[serde(rename = "refresh_period_ms", deserialize_with = "duration_from_millis")]
	pub refresh_period: Duration,
}

impl<O> SessionConfig<O> {
	pub fn new(viewer: O) -> Self {
		Self {
			viewer,
			refresh_period: DEFAULT_REFRESH_PERIOD,
		}
	}

	#[must_use]
	pub fn with_refresh_period(mut self, refresh_period: Duration) -> Self {
		self.refresh_period = refresh_period;
		self
	}
}

impl<O: Default> Default for SessionConfig<O> {
	fn default() -> Self {
		Self::new(O::default())
	}
}

fn duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
	D: Deserializer<'de>,
{
	let millis = f64::deserialize(deserializer)?;
	if !millis.is_finite() || millis <= 0.0 {
		return Err(serde::de::Error::custom(format!("refresh period must be a positive number of milliseconds, got {millis}")));
	}
	Duration::try_from_secs_f64(millis / 1000.0).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Default, PartialEq, Deserialize)]
	#[serde(default)]
	struct Options {
		material: String,
	}

	#[test]
	fn new_uses_default_refresh_period() {
		let config = SessionConfig::new(());
		assert_eq!(config.refresh_period, DEFAULT_REFRESH_PERIOD);
	}

	#[test]
	fn refresh_period_override() {
		let config = SessionConfig::<()>::default().with_refresh_period(Duration::from_millis(5));
		assert_eq!(config.refresh_period, Duration::from_millis(5));
	}

	#[test]
	fn loads_from_toml_table() {
		let config: SessionConfig<Options> = toml::from_str("refresh_period_ms = 8\n\n[viewer]\nmaterial = \"brass.mtlx\"\n").unwrap();
		assert_eq!(config.refresh_period, Duration::from_millis(8));
		assert_eq!(config.viewer.material, "brass.mtlx");
	}

	#[test]
	fn missing_fields_fall_back_to_defaults() {
		let config: SessionConfig<Options> = toml::from_str("").unwrap();
		assert_eq!(config, SessionConfig::default());
	}

	#[test]
	fn rejects_non_positive_refresh_period() {
		for text in ["refresh_period_ms = 0", "refresh_period_ms = -5", "refresh_period_ms = -0.5", "refresh_period_ms = nan"] {
			let err = toml::from_str::<SessionConfig<Options>>(text).unwrap_err();
			assert!(err.to_string().contains("positive number of milliseconds"), "{text}: {err}");
		}
	}

	#[test]
	fn rejects_unknown_fields() {
		assert!(toml::from_str::<SessionConfig<Options>>("refresh_ms = 8").is_err());
	}
}
