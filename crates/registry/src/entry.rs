use std::fmt;

use crate::Identifier;

/// Identity of one object registry (e.g. `quill:block`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistryId(Identifier);

impl RegistryId {
	pub fn new(name: Identifier) -> Self {
		Self(name)
	}

	pub fn name(&self) -> &Identifier {
		&self.0
	}
}

impl From<Identifier> for RegistryId {
	fn from(name: Identifier) -> Self {
		Self(name)
	}
}

impl fmt::Display for RegistryId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl fmt::Debug for RegistryId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "RegistryId({})", self.0)
	}
}

/// Reference to one entry held by a registry.
///
/// Carries the owning registry, the entry's name and its raw numeric slot.
/// Equality covers all three, so an entry that was removed and registered
/// again under a new slot is a different reference.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EntryRef {
	registry: RegistryId,
	id: Identifier,
	raw: u32,
}

impl EntryRef {
	pub fn new(registry: RegistryId, id: Identifier, raw: u32) -> Self {
		Self { registry, id, raw }
	}

	pub fn registry(&self) -> &RegistryId {
		&self.registry
	}

	pub fn id(&self) -> &Identifier {
		&self.id
	}

	pub fn raw(&self) -> u32 {
		self.raw
	}
}

impl fmt::Debug for EntryRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}[{}]#{}", self.registry, self.id, self.raw)
	}
}

impl fmt::Display for EntryRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.id.fmt(f)
	}
}

/// Read surface of an object registry, as seen by the tag engine.
pub trait ObjectRegistry: Send + Sync {
	/// Identity of this registry.
	fn id(&self) -> &RegistryId;

	/// Whether the registry's contents are defined by session data and can
	/// change when a server sends new data.
	fn is_dynamic(&self) -> bool;

	/// Looks up a currently registered entry by name.
	fn get(&self, id: &Identifier) -> Option<EntryRef>;
}
