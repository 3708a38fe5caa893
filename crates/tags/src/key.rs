//! Tag keys and the authority classifier.
//!
//! # Invariants
//!
//! - A (registry, name) pair is classified at most once; its [`TagKind`] never
//!   changes afterwards. [`TagKey`]s are only minted by [`TagClassifier`], so
//!   every key in circulation carries the recorded kind.

use std::fmt;

use parking_lot::RwLock;
use quill_registry::{Identifier, RegistryId};
use rustc_hash::FxHashMap;

use crate::error::TagError;

/// Where a tag's membership data legitimately comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
	/// Server-provided; empty when the server sent nothing.
	Synced,
	/// Resolved locally; never provided by a server.
	ClientOnly,
	/// Server-provided when available, otherwise a local default.
	ClientFallback,
}

impl TagKind {
	/// Whether values for this kind may arrive from a server.
	pub const fn has_sync(self) -> bool {
		matches!(self, Self::Synced | Self::ClientFallback)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Synced => "synced",
			Self::ClientOnly => "client_only",
			Self::ClientFallback => "client_fallback",
		}
	}
}

impl fmt::Display for TagKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Identity of one tag within one registry, plus its fixed authority kind.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TagKey {
	registry: RegistryId,
	name: Identifier,
	kind: TagKind,
}

impl TagKey {
	pub fn registry(&self) -> &RegistryId {
		&self.registry
	}

	pub fn name(&self) -> &Identifier {
		&self.name
	}

	pub fn kind(&self) -> TagKind {
		self.kind
	}
}

impl fmt::Debug for TagKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TagKey({} / #{} [{}])", self.registry, self.name, self.kind)
	}
}

impl fmt::Display for TagKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/#{}", self.registry, self.name)
	}
}

/// Table recording the authority kind of every known tag.
#[derive(Debug, Default)]
pub struct TagClassifier {
	kinds: RwLock<FxHashMap<(RegistryId, Identifier), TagKind>>,
}

impl TagClassifier {
	pub fn new() -> Self {
		Self::default()
	}

	/// Classifies a tag and returns its key.
	///
	/// Repeating an existing classification is fine; asking for a different
	/// kind fails with [`TagError::KindConflict`].
	pub fn classify(&self, registry: RegistryId, name: Identifier, kind: TagKind) -> Result<TagKey, TagError> {
		let slot = (registry, name);
		if let Some(&existing) = self.kinds.read().get(&slot) {
			return Self::check(slot, existing, kind);
		}

		let mut kinds = self.kinds.write();
		let existing = *kinds.entry(slot.clone()).or_insert(kind);
		drop(kinds);
		Self::check(slot, existing, kind)
	}

	fn check((registry, name): (RegistryId, Identifier), existing: TagKind, requested: TagKind) -> Result<TagKey, TagError> {
		if existing != requested {
			return Err(TagError::KindConflict {
				registry,
				name,
				existing,
				requested,
			});
		}
		Ok(TagKey { registry, name, kind: existing })
	}

	/// Returns the recorded kind, if the tag was classified.
	pub fn kind_of(&self, registry: &RegistryId, name: &Identifier) -> Option<TagKind> {
		self.kinds.read().get(&(registry.clone(), name.clone())).copied()
	}

	/// Returns the key of an already classified tag.
	pub fn key(&self, registry: &RegistryId, name: &Identifier) -> Result<TagKey, TagError> {
		match self.kind_of(registry, name) {
			Some(kind) => Ok(TagKey {
				registry: registry.clone(),
				name: name.clone(),
				kind,
			}),
			None => Err(TagError::Unclassified {
				registry: registry.clone(),
				name: name.clone(),
			}),
		}
	}

	pub fn len(&self) -> usize {
		self.kinds.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.kinds.read().is_empty()
	}
}
