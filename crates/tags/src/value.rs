use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use quill_registry::{EntryRef, RegistryId};
use rustc_hash::FxBuildHasher;

use crate::TagKey;

/// One tag's resolved membership.
///
/// Immutable and cheap to clone; updates always produce a new value, so a
/// reader holding one never sees it change.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TagValue {
	entries: Arc<[EntryRef]>,
}

impl TagValue {
	pub fn new(entries: Vec<EntryRef>) -> Self {
		Self { entries: entries.into() }
	}

	pub fn empty() -> Self {
		Self::default()
	}

	pub fn entries(&self) -> &[EntryRef] {
		&self.entries
	}

	pub fn iter(&self) -> std::slice::Iter<'_, EntryRef> {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn contains(&self, entry: &EntryRef) -> bool {
		self.entries.contains(entry)
	}
}

impl FromIterator<EntryRef> for TagValue {
	fn from_iter<I: IntoIterator<Item = EntryRef>>(iter: I) -> Self {
		Self { entries: iter.into_iter().collect() }
	}
}

impl<'a> IntoIterator for &'a TagValue {
	type Item = &'a EntryRef;
	type IntoIter = std::slice::Iter<'a, EntryRef>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl fmt::Debug for TagValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.entries.iter().map(EntryRef::id)).finish()
	}
}

/// A tag key together with its value, as yielded by tag enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
	pub key: TagKey,
	pub value: TagValue,
}

/// One generation of tag data, in insertion order.
pub type TagMap = IndexMap<TagKey, TagValue, FxBuildHasher>;

/// Owning iterator over one pinned [`TagMap`] generation.
///
/// Holding the `Arc` keeps the generation alive even if a newer one is
/// published while iterating.
#[derive(Debug, Clone)]
pub struct TagEntries {
	map: Arc<TagMap>,
	registry: Option<RegistryId>,
	pos: usize,
}

impl TagEntries {
	pub(crate) fn new(map: Arc<TagMap>) -> Self {
		Self { map, registry: None, pos: 0 }
	}

	pub(crate) fn for_registry(map: Arc<TagMap>, registry: RegistryId) -> Self {
		Self {
			map,
			registry: Some(registry),
			pos: 0,
		}
	}
}

impl Iterator for TagEntries {
	type Item = TagEntry;

	fn next(&mut self) -> Option<TagEntry> {
		while let Some((key, value)) = self.map.get_index(self.pos) {
			self.pos += 1;
			if self.registry.as_ref().is_none_or(|registry| key.registry() == registry) {
				return Some(TagEntry {
					key: key.clone(),
					value: value.clone(),
				});
			}
		}
		None
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let remaining = self.map.len().saturating_sub(self.pos);
		match self.registry {
			Some(_) => (0, Some(remaining)),
			None => (remaining, Some(remaining)),
		}
	}
}
