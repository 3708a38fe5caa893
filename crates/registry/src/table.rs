//! In-memory registry with atomic snapshot publication.
//!
//! # Invariants
//!
//! - Readers always see one complete snapshot; every mutation builds a new
//!   snapshot and publishes it with a single swap.
//! - Raw slots are never reused within one table.

use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;

use crate::events::{RegistryEventHub, RegistryEvents};
use crate::{EntryRef, Identifier, ObjectRegistry, RegistryId};

#[derive(Debug, Clone, Default)]
struct EntrySnapshot {
	by_id: FxHashMap<Identifier, u32>,
	order: Vec<Identifier>,
	next_raw: u32,
}

impl EntrySnapshot {
	fn with_entry(&self, id: &Identifier) -> (Self, u32) {
		let mut next = self.clone();
		let raw = next.next_raw;
		next.by_id.insert(id.clone(), raw);
		next.order.push(id.clone());
		next.next_raw = raw.wrapping_add(1);
		(next, raw)
	}
}

/// Runtime-mutable registry of named entries.
pub struct EntryTable {
	id: RegistryId,
	dynamic: bool,
	snap: ArcSwap<EntrySnapshot>,
	events: Arc<RegistryEventHub>,
}

impl EntryTable {
	/// Creates an empty static registry whose events live in `events`.
	pub fn with_events(id: RegistryId, events: &RegistryEvents) -> Self {
		let events = events.hub(&id);
		Self {
			id,
			dynamic: false,
			snap: ArcSwap::from_pointee(EntrySnapshot::default()),
			events,
		}
	}

	/// Marks the registry as dynamic (session-defined contents).
	pub fn dynamic(mut self) -> Self {
		self.dynamic = true;
		self
	}

	/// Registers `id`, returning its reference. Re-registering an existing
	/// name returns the existing reference without firing an event.
	pub fn register(&self, id: Identifier) -> EntryRef {
		let mut raw = 0;
		let mut added = false;
		self.snap.rcu(|snap| {
			if let Some(&existing) = snap.by_id.get(&id) {
				raw = existing;
				added = false;
				return Arc::clone(snap);
			}
			let (next, slot) = snap.with_entry(&id);
			raw = slot;
			added = true;
			Arc::new(next)
		});

		let entry = EntryRef::new(self.id.clone(), id, raw);
		if added {
			tracing::trace!(registry = %self.id, entry = %entry.id(), raw, "registry.entry_added");
			self.events.emit_entry_added(&entry);
		}
		entry
	}

	/// Removes `id`. Returns `false` if it was not registered.
	pub fn remove(&self, id: &Identifier) -> bool {
		let mut removed = false;
		self.snap.rcu(|snap| {
			if !snap.by_id.contains_key(id) {
				removed = false;
				return Arc::clone(snap);
			}
			let mut next = EntrySnapshot::clone(snap);
			next.by_id.remove(id);
			next.order.retain(|existing| existing != id);
			removed = true;
			Arc::new(next)
		});
		if removed {
			tracing::trace!(registry = %self.id, entry = %id, "registry.entry_removed");
		}
		removed
	}

	pub fn len(&self) -> usize {
		self.snap.load().order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn contains(&self, id: &Identifier) -> bool {
		self.snap.load().by_id.contains_key(id)
	}

	/// Returns every entry in registration order.
	pub fn entries(&self) -> Vec<EntryRef> {
		let snap = self.snap.load_full();
		snap.order
			.iter()
			.filter_map(|id| snap.by_id.get(id).map(|&raw| EntryRef::new(self.id.clone(), id.clone(), raw)))
			.collect()
	}
}

impl ObjectRegistry for EntryTable {
	fn id(&self) -> &RegistryId {
		&self.id
	}

	fn is_dynamic(&self) -> bool {
		self.dynamic
	}

	fn get(&self, id: &Identifier) -> Option<EntryRef> {
		let raw = *self.snap.load().by_id.get(id)?;
		Some(EntryRef::new(self.id.clone(), id.clone(), raw))
	}
}

impl std::fmt::Debug for EntryTable {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EntryTable")
			.field("id", &self.id)
			.field("dynamic", &self.dynamic)
			.field("len", &self.len())
			.finish()
	}
}
