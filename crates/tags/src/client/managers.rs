use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use quill_registry::{ObjectRegistry, RegistryId};
use rustc_hash::FxBuildHasher;

use super::ClientTagManager;
use crate::TagClassifier;

/// Table of client tag managers keyed by registry identity.
///
/// A manager is created the first time its registry is seen and is never
/// removed; registries live for the whole process, so the table is bounded
/// by the number of registries.
#[derive(Debug)]
pub struct ClientTagManagers {
	classifier: Arc<TagClassifier>,
	managers: RwLock<IndexMap<RegistryId, Arc<ClientTagManager>, FxBuildHasher>>,
}

impl ClientTagManagers {
	pub fn new(classifier: Arc<TagClassifier>) -> Self {
		Self {
			classifier,
			managers: RwLock::new(IndexMap::default()),
		}
	}

	/// Returns the manager of `registry`, creating it on first access.
	pub fn manager_for(&self, registry: Arc<dyn ObjectRegistry>) -> Arc<ClientTagManager> {
		if let Some(manager) = self.get(registry.id()) {
			return manager;
		}
		let mut managers = self.managers.write();
		let id = registry.id().clone();
		managers
			.entry(id)
			.or_insert_with(|| {
				tracing::debug!(domain = "tags", registry = %registry.id(), "tags.client.manager_created");
				Arc::new(ClientTagManager::new(registry.clone(), self.classifier.clone()))
			})
			.clone()
	}

	pub fn get(&self, registry: &RegistryId) -> Option<Arc<ClientTagManager>> {
		self.managers.read().get(registry).cloned()
	}

	/// Visits every manager in creation order.
	///
	/// The visitor runs without the table lock held, so it may create managers;
	/// those are not part of the current visit.
	pub fn for_each(&self, mut visitor: impl FnMut(&Arc<ClientTagManager>)) {
		let managers: Vec<_> = self.managers.read().values().cloned().collect();
		for manager in &managers {
			visitor(manager);
		}
	}

	pub fn len(&self) -> usize {
		self.managers.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.managers.read().is_empty()
	}
}
