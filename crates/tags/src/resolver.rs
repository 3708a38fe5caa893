//! Tag lookup facade.
//!
//! # Resolution Order
//!
//! - [`TagKind::Synced`]: synced store, else empty.
//! - [`TagKind::ClientFallback`]: synced store, else the registry manager's
//!   fallback default, else empty.
//! - [`TagKind::ClientOnly`]: the registry manager's client-only value, else
//!   empty.

use std::sync::Arc;

use quill_registry::{EntryRef, Identifier, ObjectRegistry, RegistryId};
use tokio::task::JoinHandle;

use crate::client::{ClientTagManager, ClientTagManagers};
use crate::config::TagsConfig;
use crate::error::TagError;
use crate::lifecycle::SessionEvents;
use crate::reload::{ReloadPipeline, ReloadReport};
use crate::source::ResourceSource;
use crate::synced::SyncedTagStore;
use crate::value::{TagEntries, TagEntry};
use crate::{TagClassifier, TagKey, TagKind, TagValue};

/// Single entry point for tag lookups, server data receipt and reloads.
///
/// Cloning is cheap; clones share all state.
#[derive(Debug, Clone)]
pub struct TagResolver {
	config: Arc<TagsConfig>,
	classifier: Arc<TagClassifier>,
	synced: Arc<SyncedTagStore>,
	managers: Arc<ClientTagManagers>,
	pipeline: ReloadPipeline,
}

impl Default for TagResolver {
	fn default() -> Self {
		Self::new(TagsConfig::default())
	}
}

impl TagResolver {
	pub fn new(config: TagsConfig) -> Self {
		let classifier = Arc::new(TagClassifier::new());
		let managers = Arc::new(ClientTagManagers::new(classifier.clone()));
		let pipeline = ReloadPipeline::new(managers.clone(), config.reload.clone());
		Self {
			config: Arc::new(config),
			classifier,
			synced: Arc::new(SyncedTagStore::new()),
			managers,
			pipeline,
		}
	}

	pub fn config(&self) -> &TagsConfig {
		&self.config
	}

	pub fn classifier(&self) -> &Arc<TagClassifier> {
		&self.classifier
	}

	pub fn synced(&self) -> &Arc<SyncedTagStore> {
		&self.synced
	}

	pub fn managers(&self) -> &Arc<ClientTagManagers> {
		&self.managers
	}

	pub fn pipeline(&self) -> &ReloadPipeline {
		&self.pipeline
	}

	/// Classifies a tag; see [`TagClassifier::classify`].
	pub fn classify(&self, registry: RegistryId, name: Identifier, kind: TagKind) -> Result<TagKey, TagError> {
		self.classifier.classify(registry, name, kind)
	}

	/// Registers a registry that declares client tags and returns its manager.
	pub fn track_registry(&self, registry: Arc<dyn ObjectRegistry>) -> Arc<ClientTagManager> {
		self.managers.manager_for(registry)
	}

	/// Subscribes the synced store to session stop.
	pub fn attach(&self, events: &SessionEvents) {
		events.on_stop(self.synced.clone());
	}

	/// Resolves `key` per its authority kind. Never fails.
	pub fn resolve(&self, key: &TagKey) -> TagValue {
		match key.kind() {
			TagKind::Synced => self.synced.get(key).unwrap_or_default(),
			TagKind::ClientFallback => self
				.synced
				.get(key)
				.unwrap_or_else(|| self.manager_value(key, ClientTagManager::fallback_tag)),
			TagKind::ClientOnly => self.manager_value(key, ClientTagManager::client_tag),
		}
	}

	fn manager_value(&self, key: &TagKey, lookup: impl FnOnce(&ClientTagManager, &TagKey) -> TagValue) -> TagValue {
		self.managers
			.get(key.registry())
			.map(|manager| lookup(manager.as_ref(), key))
			.unwrap_or_default()
	}

	/// Resolves a tag by name.
	///
	/// Every name must be classified before its first lookup; an unclassified
	/// name is a configuration error.
	pub fn resolve_by_name(&self, registry: &RegistryId, name: &Identifier) -> Result<TagValue, TagError> {
		match self.classifier.key(registry, name) {
			Ok(key) => Ok(self.resolve(&key)),
			Err(err) => {
				tracing::error!(domain = "tags", error = %err, "tag lookup before classification");
				Err(err)
			}
		}
	}

	/// Synced tags of `registry`, in store order.
	pub fn stream_tags(&self, registry: &RegistryId) -> TagEntries {
		self.synced.stream(registry)
	}

	/// Synced tags of `registry`, followed by fallback defaults for every
	/// fallback tag the synced store lacks. No key is yielded twice.
	pub fn stream_tags_with_fallback(&self, registry: &RegistryId) -> impl Iterator<Item = TagEntry> + use<> {
		let synced = self.synced.snapshot();
		let shadow = synced.clone();
		let fallback = self.managers.get(registry).map(|manager| manager.fallback_tags());
		TagEntries::for_registry(synced, registry.clone()).chain(
			fallback
				.into_iter()
				.flatten()
				.filter(move |entry| !shadow.contains_key(&entry.key)),
		)
	}

	/// Installs server-provided tags, replacing the previous synced generation.
	///
	/// When configured, dynamic registries' client tags are then re-resolved
	/// against entries the server data may have introduced.
	pub fn receive_server_tags(&self, tags: impl IntoIterator<Item = (TagKey, Vec<EntryRef>)>) {
		self.synced.populate(tags);
		if !self.config.reload.rebind_dynamic_on_sync {
			return;
		}
		self.managers.for_each(|manager| {
			if manager.is_dynamic() {
				manager.rebind();
			}
		});
	}

	/// Starts a client tag reload cycle; see [`ReloadPipeline::reload`].
	pub fn reload(&self, source: Arc<dyn ResourceSource>) -> JoinHandle<ReloadReport> {
		self.pipeline.reload(source)
	}
}
