//! Resource sources that supply raw client tag definitions.

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use quill_registry::{Identifier, RegistryId};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

use crate::definition::TagFile;
use crate::error::ResourceError;

/// Directory of tag definitions for one registry under one resource root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagRequest {
	pub root: String,
	pub registry: RegistryId,
}

impl TagRequest {
	pub fn new(root: impl Into<String>, registry: RegistryId) -> Self {
		Self {
			root: root.into(),
			registry,
		}
	}

	/// Directory path, e.g. `client_only_tags/block`.
	pub fn dir(&self) -> String {
		format!("{}/{}", self.root, self.registry.name().to_dir_segment())
	}
}

/// Supplier of raw tag definitions.
///
/// Implementations locate and parse resources; the tag engine only consumes
/// the structured result. Both calls may fail independently.
#[async_trait]
pub trait ResourceSource: Send + Sync {
	/// Lists the tag names defined under `request`.
	async fn list(&self, request: &TagRequest) -> Result<Vec<Identifier>, ResourceError>;

	/// Reads the stacked files defining `tag`, lowest priority first.
	async fn read(&self, request: &TagRequest, tag: &Identifier) -> Result<Vec<TagFile>, ResourceError>;
}

type DirFiles = IndexMap<Identifier, Vec<TagFile>, FxBuildHasher>;

/// In-memory resource source keyed by directory path.
///
/// Directories or single tags can be marked as failing to exercise partial
/// reload failures.
#[derive(Debug, Default)]
pub struct MemoryResourceSource {
	dirs: RwLock<FxHashMap<String, DirFiles>>,
	failing_dirs: RwLock<FxHashSet<String>>,
	failing_tags: RwLock<FxHashSet<(String, Identifier)>>,
}

impl MemoryResourceSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stacks `file` on top of any files already present for `tag`.
	pub fn insert(&self, request: &TagRequest, tag: Identifier, file: TagFile) {
		self.dirs.write().entry(request.dir()).or_default().entry(tag).or_default().push(file);
	}

	/// Makes listing `request` fail (or succeed again).
	pub fn set_failing(&self, request: &TagRequest, failing: bool) {
		let mut dirs = self.failing_dirs.write();
		if failing {
			dirs.insert(request.dir());
		} else {
			dirs.remove(&request.dir());
		}
	}

	/// Makes reading one tag under `request` fail.
	pub fn fail_tag(&self, request: &TagRequest, tag: Identifier) {
		self.failing_tags.write().insert((request.dir(), tag));
	}
}

#[async_trait]
impl ResourceSource for MemoryResourceSource {
	async fn list(&self, request: &TagRequest) -> Result<Vec<Identifier>, ResourceError> {
		let dir = request.dir();
		if self.failing_dirs.read().contains(&dir) {
			return Err(ResourceError::List {
				dir,
				reason: "marked as failing".to_string(),
			});
		}
		Ok(self.dirs.read().get(&dir).map(|files| files.keys().cloned().collect()).unwrap_or_default())
	}

	async fn read(&self, request: &TagRequest, tag: &Identifier) -> Result<Vec<TagFile>, ResourceError> {
		let dir = request.dir();
		if self.failing_tags.read().contains(&(dir.clone(), tag.clone())) {
			return Err(ResourceError::Read {
				dir,
				tag: tag.clone(),
				reason: "marked as failing".to_string(),
			});
		}
		let files = self.dirs.read().get(&dir).and_then(|files| files.get(tag).cloned());
		files.ok_or_else(|| ResourceError::Read {
			dir,
			tag: tag.clone(),
			reason: "not found".to_string(),
		})
	}
}
