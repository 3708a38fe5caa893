//! Raw tag definitions and their resolution against a registry.
//!
//! A resource source yields [`TagFile`]s per tag name, possibly several
//! stacked files for the same name. They fold into one [`TagBuilder`]; binding
//! a set of builders against an [`ObjectRegistry`] produces [`TagValue`]s.

use indexmap::IndexMap;
use quill_registry::{EntryRef, Identifier, ObjectRegistry};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

use crate::TagValue;

/// What a tag file entry points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagTarget {
	/// A registry entry.
	Element(Identifier),
	/// Every member of another tag of the same registry and kind.
	Tag(Identifier),
}

/// One line of a tag file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFileEntry {
	pub target: TagTarget,
	/// Optional entries are skipped quietly when they don't resolve.
	pub required: bool,
}

impl TagFileEntry {
	pub fn element(id: Identifier) -> Self {
		Self {
			target: TagTarget::Element(id),
			required: true,
		}
	}

	pub fn tag(id: Identifier) -> Self {
		Self {
			target: TagTarget::Tag(id),
			required: true,
		}
	}

	pub fn optional(mut self) -> Self {
		self.required = false;
		self
	}
}

/// One parsed tag definition file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFile {
	/// Discard whatever lower files stacked for this tag.
	pub replace: bool,
	pub values: Vec<TagFileEntry>,
}

impl TagFile {
	pub fn new(values: Vec<TagFileEntry>) -> Self {
		Self { replace: false, values }
	}

	pub fn replacing(values: Vec<TagFileEntry>) -> Self {
		Self { replace: true, values }
	}
}

/// Unresolved membership of one tag, folded from its stacked files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagBuilder {
	entries: Vec<TagFileEntry>,
}

impl TagBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Folds files in stacking order.
	pub fn from_files(files: impl IntoIterator<Item = TagFile>) -> Self {
		let mut builder = Self::new();
		builder.extend(files);
		builder
	}

	pub fn add_file(&mut self, file: TagFile) {
		if file.replace {
			self.entries.clear();
		}
		self.entries.extend(file.values);
	}

	pub fn entries(&self) -> &[TagFileEntry] {
		&self.entries
	}
}

impl Extend<TagFile> for TagBuilder {
	fn extend<I: IntoIterator<Item = TagFile>>(&mut self, files: I) {
		for file in files {
			self.add_file(file);
		}
	}
}

/// Builders keyed by tag name, in source order.
pub type TagBuilders = IndexMap<Identifier, TagBuilder, FxBuildHasher>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
	UnknownEntry,
	UnknownTag,
	Cycle,
}

impl DropReason {
	const fn as_str(self) -> &'static str {
		match self {
			Self::UnknownEntry => "unknown entry",
			Self::UnknownTag => "unknown tag",
			Self::Cycle => "reference cycle",
		}
	}
}

/// Resolves a builder set against the registry's current entries.
///
/// Nested tag references resolve within the same set. Unresolvable required
/// references and reference cycles are dropped and counted, never fatal.
pub(crate) struct Binder<'a> {
	registry: &'a dyn ObjectRegistry,
	builders: &'a TagBuilders,
	/// `None` marks a tag whose resolution is in progress.
	resolved: FxHashMap<Identifier, Option<Vec<EntryRef>>>,
	dropped: usize,
}

impl<'a> Binder<'a> {
	pub(crate) fn new(registry: &'a dyn ObjectRegistry, builders: &'a TagBuilders) -> Self {
		Self {
			registry,
			builders,
			resolved: FxHashMap::default(),
			dropped: 0,
		}
	}

	/// Number of references dropped so far.
	pub(crate) fn dropped(&self) -> usize {
		self.dropped
	}

	pub(crate) fn bind(&mut self, name: &Identifier) -> TagValue {
		TagValue::new(self.resolve(name).unwrap_or_default())
	}

	fn resolve(&mut self, name: &Identifier) -> Option<Vec<EntryRef>> {
		match self.resolved.get(name) {
			Some(Some(done)) => return Some(done.clone()),
			Some(None) => return None,
			None => {}
		}
		let builders = self.builders;
		let builder = builders.get(name)?;
		self.resolved.insert(name.clone(), None);

		let mut seen = FxHashSet::default();
		let mut out = Vec::new();
		for entry in builder.entries() {
			match &entry.target {
				TagTarget::Element(id) => match self.registry.get(id) {
					Some(found) => {
						if seen.insert(found.clone()) {
							out.push(found);
						}
					}
					None => self.drop_reference(name, entry, DropReason::UnknownEntry),
				},
				TagTarget::Tag(nested) => {
					if matches!(self.resolved.get(nested), Some(None)) {
						self.drop_reference(name, entry, DropReason::Cycle);
						continue;
					}
					match self.resolve(nested) {
						Some(members) => {
							for member in members {
								if seen.insert(member.clone()) {
									out.push(member);
								}
							}
						}
						None => self.drop_reference(name, entry, DropReason::UnknownTag),
					}
				}
			}
		}

		self.resolved.insert(name.clone(), Some(out.clone()));
		Some(out)
	}

	fn drop_reference(&mut self, tag: &Identifier, entry: &TagFileEntry, reason: DropReason) {
		// Cycles are definition bugs even on optional lines.
		if !entry.required && reason != DropReason::Cycle {
			return;
		}
		self.dropped += 1;
		let reference = match &entry.target {
			TagTarget::Element(id) => id.to_string(),
			TagTarget::Tag(id) => format!("#{id}"),
		};
		tracing::warn!(
			domain = "tags",
			registry = %self.registry.id(),
			tag = %tag,
			reference,
			reason = reason.as_str(),
			"dropping unresolved tag reference",
		);
	}
}
