//! Per-registry event state kept in a side-table.
//!
//! Registries do not carry their event listeners themselves. Each registry's
//! [`RegistryEventHub`] lives in a [`RegistryEvents`] table keyed by
//! [`RegistryId`], created on first access and never removed. The number of
//! hubs is bounded by the number of registries.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{EntryRef, RegistryId};

/// Listener invoked after an entry was added to a registry.
pub type EntryAddedListener = Arc<dyn Fn(&EntryRef) + Send + Sync>;

/// Event listeners for one registry.
#[derive(Default)]
pub struct RegistryEventHub {
	entry_added: RwLock<Vec<EntryAddedListener>>,
}

impl RegistryEventHub {
	/// Subscribes to entry additions. Listeners run in subscription order.
	pub fn on_entry_added(&self, listener: impl Fn(&EntryRef) + Send + Sync + 'static) {
		self.entry_added.write().push(Arc::new(listener));
	}

	/// Notifies every entry-added listener.
	pub fn emit_entry_added(&self, entry: &EntryRef) {
		// Listeners may subscribe further listeners; don't call them under the lock.
		let listeners = self.entry_added.read().clone();
		for listener in &listeners {
			listener(entry);
		}
	}

	pub fn entry_added_listeners(&self) -> usize {
		self.entry_added.read().len()
	}
}

impl std::fmt::Debug for RegistryEventHub {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RegistryEventHub")
			.field("entry_added", &self.entry_added_listeners())
			.finish()
	}
}

/// Side-table from registry identity to its event hub.
#[derive(Debug, Default)]
pub struct RegistryEvents {
	hubs: RwLock<FxHashMap<RegistryId, Arc<RegistryEventHub>>>,
}

impl RegistryEvents {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the hub for `registry`, creating it on first access.
	pub fn hub(&self, registry: &RegistryId) -> Arc<RegistryEventHub> {
		if let Some(hub) = self.hubs.read().get(registry) {
			return hub.clone();
		}
		self.hubs.write().entry(registry.clone()).or_default().clone()
	}

	/// Number of registries that have a hub.
	pub fn len(&self) -> usize {
		self.hubs.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.hubs.read().is_empty()
	}
}
