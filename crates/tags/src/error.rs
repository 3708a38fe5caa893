use std::path::PathBuf;

use quill_registry::{Identifier, RegistryId};

use crate::TagKind;

/// Classification errors.
///
/// Lookups never fail; only the APIs that turn names into keys do.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
	/// A tag was classified again with a different authority kind.
	#[error("tag {registry}/{name} is {existing}, cannot reclassify as {requested}")]
	KindConflict {
		registry: RegistryId,
		name: Identifier,
		existing: TagKind,
		requested: TagKind,
	},

	/// A tag was looked up by name before it was ever classified.
	#[error("tag {registry}/{name} was never classified")]
	Unclassified { registry: RegistryId, name: Identifier },
}

/// Failure of a resource source to produce tag definitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
	/// The tag directory itself could not be listed.
	#[error("cannot list {dir}: {reason}")]
	List { dir: String, reason: String },

	/// One tag's definition files could not be read.
	#[error("cannot read {dir}/{tag}: {reason}")]
	Read { dir: String, tag: Identifier, reason: String },
}

/// Why one manager's contribution to a reload cycle was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReloadError {
	#[error(transparent)]
	Resource(#[from] ResourceError),

	#[error("task panicked: {0}")]
	Panicked(String),

	#[error("task was cancelled")]
	Cancelled,
}

impl ReloadError {
	pub(crate) fn from_join(err: tokio::task::JoinError) -> Self {
		match quill_worker::join_error_panic_message(err) {
			Some(msg) => Self::Panicked(msg),
			None => Self::Cancelled,
		}
	}
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("cannot read config {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid tags config: {0}")]
	Parse(#[from] toml::de::Error),
}
