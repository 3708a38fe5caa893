//! Tag storage, precedence resolution and client-only tag reloads.
//!
//! Tags map a name to the registry entries it currently contains. Their data
//! comes from three authorities, chosen per tag by its [`TagKind`]:
//!
//! - [`SyncedTagStore`]: server-provided tags, replaced wholesale on every
//!   receipt and cleared when the session stops
//! - [`ClientTagManager`]: per-registry client-only tags and client-fallback
//!   defaults, refreshed by the [`ReloadPipeline`]
//! - [`TagResolver`]: the facade combining both per the precedence rules
//!
//! Every mapping is published as a whole generation through an atomic swap;
//! readers never observe a partially applied update.

use std::sync::OnceLock;

pub mod client;
pub mod config;
pub mod definition;
mod error;
mod key;
pub mod lifecycle;
pub mod reload;
mod resolver;
pub mod source;
mod synced;
mod value;

#[cfg(test)]
mod test_fixtures;

pub use client::{ApplyStats, ClientTagManager, ClientTagManagers, ClientTagView, RawTags};
pub use config::{ReloadConfig, TagsConfig};
pub use definition::{TagBuilder, TagBuilders, TagFile, TagFileEntry, TagTarget};
pub use error::{ConfigError, ReloadError, ResourceError, TagError};
pub use key::{TagClassifier, TagKey, TagKind};
pub use lifecycle::{SessionEvents, SessionStopped};
pub use reload::{AppliedTags, ReloadFailure, ReloadPhase, ReloadPipeline, ReloadReport};
pub use resolver::TagResolver;
pub use source::{MemoryResourceSource, ResourceSource, TagRequest};
pub use synced::SyncedTagStore;
pub use value::{TagEntries, TagEntry, TagMap, TagValue};

/// Process-wide resolver, initialized from config at startup.
static GLOBAL: OnceLock<TagResolver> = OnceLock::new();

/// Initializes the process-wide resolver.
///
/// Once a resolver exists, whether from an earlier call or from [`global`],
/// `config` is discarded with a warning.
pub fn init_global(config: TagsConfig) {
	if GLOBAL.set(TagResolver::new(config)).is_err() {
		tracing::warn!(domain = "tags", "tag resolver already initialized; ignoring config");
	}
}

/// Returns the process-wide resolver, creating a default one if
/// [`init_global`] was never called.
pub fn global() -> &'static TagResolver {
	GLOBAL.get_or_init(TagResolver::default)
}

#[cfg(test)]
mod global_tests {
	use std::sync::Arc;

	use super::*;

	#[test]
	fn global_resolver_is_shared() {
		init_global(TagsConfig::default());
		assert!(std::ptr::eq(global(), global()));
		assert!(Arc::ptr_eq(global().classifier(), global().clone().classifier()));
	}

	#[test]
	fn late_init_keeps_existing_config() {
		let existing = global().config().clone();
		let mut late = TagsConfig::default();
		late.reload.max_concurrent_loads = existing.reload.max_concurrent_loads + 7;
		init_global(late);
		assert_eq!(global().config(), &existing);
	}
}
