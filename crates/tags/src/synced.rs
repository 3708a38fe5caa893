//! Server-provided tag store.
//!
//! # Invariants
//!
//! - [`SyncedTagStore::populate`] and [`SyncedTagStore::reset`] replace the
//!   whole generation with one atomic swap; readers see either the previous
//!   or the next generation.
//! - The store never holds [`TagKind::ClientOnly`] keys.

use std::sync::Arc;

use arc_swap::ArcSwap;
use quill_registry::{EntryRef, RegistryId};

use crate::lifecycle::SessionStopped;
use crate::value::{TagEntries, TagMap};
use crate::{TagKey, TagKind, TagValue};

#[derive(Debug, Default)]
pub struct SyncedTagStore {
	tags: ArcSwap<TagMap>,
}

impl SyncedTagStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the whole store with the supplied tags.
	///
	/// Client-only keys are refused with a warning.
	pub fn populate(&self, tags: impl IntoIterator<Item = (TagKey, Vec<EntryRef>)>) {
		let mut next = TagMap::default();
		let mut refused = 0usize;
		for (key, entries) in tags {
			if key.kind() == TagKind::ClientOnly {
				refused += 1;
				tracing::warn!(domain = "tags", tag = %key, "refusing server data for client-only tag");
				continue;
			}
			next.insert(key, TagValue::new(entries));
		}
		tracing::debug!(domain = "tags", tags = next.len(), refused, "tags.synced.populate");
		self.tags.store(Arc::new(next));
	}

	/// Drops every synced tag.
	pub fn reset(&self) {
		let previous = self.tags.swap(Arc::new(TagMap::default()));
		tracing::debug!(domain = "tags", dropped = previous.len(), "tags.synced.reset");
	}

	pub fn get(&self, key: &TagKey) -> Option<TagValue> {
		self.tags.load().get(key).cloned()
	}

	pub fn contains(&self, key: &TagKey) -> bool {
		self.tags.load().contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.tags.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.tags.load().is_empty()
	}

	/// Pins the current generation.
	pub fn snapshot(&self) -> Arc<TagMap> {
		self.tags.load_full()
	}

	/// Iterates the current generation's tags of one registry.
	pub fn stream(&self, registry: &RegistryId) -> TagEntries {
		TagEntries::for_registry(self.snapshot(), registry.clone())
	}
}

impl SessionStopped for SyncedTagStore {
	fn session_stopped(&self) {
		self.reset();
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use quill_registry::Identifier;

	use super::*;
	use crate::TagClassifier;

	fn id(s: &str) -> Identifier {
		Identifier::parse(s).unwrap()
	}

	fn entry(registry: &RegistryId, name: &str, raw: u32) -> EntryRef {
		EntryRef::new(registry.clone(), id(name), raw)
	}

	#[test]
	fn populate_replaces_previous_generation() {
		let classifier = TagClassifier::new();
		let blocks = RegistryId::new(id("block"));
		let a = classifier.classify(blocks.clone(), id("a"), TagKind::Synced).unwrap();
		let b = classifier.classify(blocks.clone(), id("b"), TagKind::Synced).unwrap();
		let store = SyncedTagStore::new();

		store.populate([(a.clone(), vec![entry(&blocks, "x", 0)])]);
		store.populate([(b.clone(), vec![entry(&blocks, "y", 1)])]);
		assert!(store.get(&a).is_none());
		assert_eq!(store.get(&b).unwrap().len(), 1);
	}

	#[test]
	fn client_only_keys_are_refused() {
		let classifier = TagClassifier::new();
		let blocks = RegistryId::new(id("block"));
		let local = classifier.classify(blocks.clone(), id("local"), TagKind::ClientOnly).unwrap();
		let shared = classifier.classify(blocks.clone(), id("shared"), TagKind::ClientFallback).unwrap();
		let store = SyncedTagStore::new();

		store.populate([(local.clone(), vec![]), (shared.clone(), vec![])]);
		assert!(!store.contains(&local));
		assert!(store.contains(&shared));
	}

	#[test]
	fn reset_and_session_stop_clear_everything() {
		let classifier = TagClassifier::new();
		let blocks = RegistryId::new(id("block"));
		let a = classifier.classify(blocks.clone(), id("a"), TagKind::Synced).unwrap();
		let store = SyncedTagStore::new();

		store.populate([(a.clone(), vec![])]);
		store.reset();
		assert!(store.is_empty());

		store.populate([(a.clone(), vec![])]);
		store.session_stopped();
		assert!(store.get(&a).is_none());
	}

	#[test]
	fn pinned_snapshot_survives_reset() {
		let classifier = TagClassifier::new();
		let blocks = RegistryId::new(id("block"));
		let a = classifier.classify(blocks.clone(), id("a"), TagKind::Synced).unwrap();
		let store = SyncedTagStore::new();
		store.populate([(a.clone(), vec![entry(&blocks, "x", 0)])]);

		let stream = store.stream(&blocks);
		store.reset();
		let seen: Vec<_> = stream.map(|e| e.key).collect();
		assert_eq!(seen, vec![a]);
	}

	#[test]
	fn stream_filters_by_registry_in_store_order() {
		let classifier = TagClassifier::new();
		let blocks = RegistryId::new(id("block"));
		let items = RegistryId::new(id("item"));
		let b1 = classifier.classify(blocks.clone(), id("one"), TagKind::Synced).unwrap();
		let i1 = classifier.classify(items.clone(), id("one"), TagKind::Synced).unwrap();
		let b2 = classifier.classify(blocks.clone(), id("two"), TagKind::Synced).unwrap();
		let store = SyncedTagStore::new();
		store.populate([(b1.clone(), vec![]), (i1, vec![]), (b2.clone(), vec![])]);

		let keys: Vec<_> = store.stream(&blocks).map(|e| e.key).collect();
		assert_eq!(keys, vec![b1, b2]);
	}
}
