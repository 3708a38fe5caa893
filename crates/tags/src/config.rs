//! Tag engine configuration.
//!
//! ```toml
//! [reload]
//! max_concurrent_loads = 4
//! client_only_dir = "client_only_tags"
//! fallback_dir = "tags"
//! rebind_dynamic_on_sync = true
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagsConfig {
	pub reload: ReloadConfig,
}

/// Settings for client-only tag reload cycles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReloadConfig {
	/// Upper bound on manager loads running at once. `0` means unbounded.
	pub max_concurrent_loads: usize,
	/// Resource root holding client-only tag definitions.
	pub client_only_dir: String,
	/// Resource root holding client-fallback tag defaults.
	pub fallback_dir: String,
	/// Re-resolve dynamic registries' client tags when server data arrives.
	pub rebind_dynamic_on_sync: bool,
}

impl Default for ReloadConfig {
	fn default() -> Self {
		Self {
			max_concurrent_loads: 0,
			client_only_dir: "client_only_tags".to_string(),
			fallback_dir: "tags".to_string(),
			rebind_dynamic_on_sync: true,
		}
	}
}

impl TagsConfig {
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	/// Reads and parses a TOML config file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&input)
	}
}
