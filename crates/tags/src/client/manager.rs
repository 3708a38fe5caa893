use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use quill_registry::{Identifier, ObjectRegistry, RegistryId};

use crate::config::ReloadConfig;
use crate::definition::{Binder, TagBuilder, TagBuilders};
use crate::error::ResourceError;
use crate::source::{ResourceSource, TagRequest};
use crate::value::{TagEntries, TagMap};
use crate::{TagClassifier, TagKey, TagKind, TagValue};

/// Unresolved client tag data produced by [`ClientTagManager::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTags {
	pub client_only: TagBuilders,
	pub fallback: TagBuilders,
}

/// Outcome of committing one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
	/// Generation number that was committed.
	pub generation: u64,
	pub client_only: usize,
	pub fallback: usize,
	/// References dropped because they did not resolve.
	pub dropped: usize,
	/// Tags skipped because their name is classified with another kind.
	pub conflicts: usize,
}

#[derive(Debug, Default)]
struct ClientTagState {
	generation: u64,
	client_only: Arc<TagMap>,
	fallback: Arc<TagMap>,
	raw: Arc<RawTags>,
}

/// Locally resolved tag data of one registry.
///
/// Holds two mappings, client-only tags and client-fallback defaults, which
/// are always replaced together in one swap.
pub struct ClientTagManager {
	registry: Arc<dyn ObjectRegistry>,
	classifier: Arc<TagClassifier>,
	state: ArcSwap<ClientTagState>,
	/// Serializes commits so a rebind can't overwrite a newer apply.
	commit: Mutex<()>,
}

impl ClientTagManager {
	pub(crate) fn new(registry: Arc<dyn ObjectRegistry>, classifier: Arc<TagClassifier>) -> Self {
		Self {
			registry,
			classifier,
			state: ArcSwap::from_pointee(ClientTagState::default()),
			commit: Mutex::new(()),
		}
	}

	pub fn registry_id(&self) -> &RegistryId {
		self.registry.id()
	}

	pub fn is_dynamic(&self) -> bool {
		self.registry.is_dynamic()
	}

	/// Number of generations committed so far.
	pub fn generation(&self) -> u64 {
		self.state.load().generation
	}

	/// Reads raw tag data for this registry. Touches no manager state.
	pub async fn load(&self, source: &dyn ResourceSource, config: &ReloadConfig) -> Result<RawTags, ResourceError> {
		let registry = self.registry_id().clone();
		let client_only = load_dir(source, &TagRequest::new(&config.client_only_dir, registry.clone())).await?;
		let fallback = load_dir(source, &TagRequest::new(&config.fallback_dir, registry)).await?;
		Ok(RawTags { client_only, fallback })
	}

	/// Resolves `raw` against the registry's current entries and commits it.
	pub fn apply_raw(&self, raw: RawTags) -> ApplyStats {
		let _commit = self.commit.lock();
		self.commit_locked(Arc::new(raw))
	}

	/// Re-resolves the committed raw data against the current entries.
	pub fn rebind(&self) -> ApplyStats {
		let _commit = self.commit.lock();
		let raw = self.state.load().raw.clone();
		self.commit_locked(raw)
	}

	fn commit_locked(&self, raw: Arc<RawTags>) -> ApplyStats {
		let generation = self.generation() + 1;
		let mut stats = ApplyStats {
			generation,
			..ApplyStats::default()
		};
		let client_only = self.bind_set(&raw.client_only, TagKind::ClientOnly, &mut stats);
		let fallback = self.bind_set(&raw.fallback, TagKind::ClientFallback, &mut stats);
		stats.client_only = client_only.len();
		stats.fallback = fallback.len();

		self.state.store(Arc::new(ClientTagState {
			generation,
			client_only: Arc::new(client_only),
			fallback: Arc::new(fallback),
			raw,
		}));
		tracing::debug!(
			domain = "tags",
			registry = %self.registry_id(),
			generation,
			client_only = stats.client_only,
			fallback = stats.fallback,
			dropped = stats.dropped,
			"tags.client.commit",
		);
		stats
	}

	fn bind_set(&self, builders: &TagBuilders, kind: TagKind, stats: &mut ApplyStats) -> TagMap {
		let mut binder = Binder::new(self.registry.as_ref(), builders);
		let mut out = TagMap::default();
		for name in builders.keys() {
			let key = match self.classifier.classify(self.registry_id().clone(), name.clone(), kind) {
				Ok(key) => key,
				Err(err) => {
					stats.conflicts += 1;
					tracing::warn!(domain = "tags", error = %err, "skipping client tag");
					continue;
				}
			};
			let value = binder.bind(name);
			out.insert(key, value);
		}
		stats.dropped += binder.dropped();
		out
	}

	/// Pins the committed generation; both mappings come from the same commit.
	pub fn view(&self) -> ClientTagView {
		ClientTagView {
			state: self.state.load_full(),
		}
	}

	/// Committed client-only value, or empty.
	pub fn client_tag(&self, key: &TagKey) -> TagValue {
		self.view().client_tag(key)
	}

	/// Committed client-fallback default, or empty.
	pub fn fallback_tag(&self, key: &TagKey) -> TagValue {
		self.view().fallback_tag(key)
	}

	/// Iterates the committed client-only tags.
	pub fn client_tags(&self) -> TagEntries {
		self.view().client_tags()
	}

	/// Iterates the committed fallback defaults.
	pub fn fallback_tags(&self) -> TagEntries {
		self.view().fallback_tags()
	}
}

/// One committed generation of a [`ClientTagManager`].
///
/// Later commits don't affect a view that is already held.
#[derive(Debug, Clone)]
pub struct ClientTagView {
	state: Arc<ClientTagState>,
}

impl ClientTagView {
	pub fn generation(&self) -> u64 {
		self.state.generation
	}

	pub fn client_tag(&self, key: &TagKey) -> TagValue {
		self.state.client_only.get(key).cloned().unwrap_or_default()
	}

	pub fn fallback_tag(&self, key: &TagKey) -> TagValue {
		self.state.fallback.get(key).cloned().unwrap_or_default()
	}

	pub fn client_tags(&self) -> TagEntries {
		TagEntries::new(self.state.client_only.clone())
	}

	pub fn fallback_tags(&self) -> TagEntries {
		TagEntries::new(self.state.fallback.clone())
	}
}

impl std::fmt::Debug for ClientTagManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.load();
		f.debug_struct("ClientTagManager")
			.field("registry", self.registry_id())
			.field("generation", &state.generation)
			.field("client_only", &state.client_only.len())
			.field("fallback", &state.fallback.len())
			.finish()
	}
}

async fn load_dir(source: &dyn ResourceSource, request: &TagRequest) -> Result<TagBuilders, ResourceError> {
	let names: Vec<Identifier> = source.list(request).await?;
	let mut builders = TagBuilders::default();
	for name in names {
		let files = source.read(request, &name).await?;
		builders.entry(name).or_insert_with(TagBuilder::new).extend(files);
	}
	Ok(builders)
}
