use std::sync::Arc;

use quill_registry::{EntryTable, Identifier, RegistryEvents, RegistryId};

use crate::TagValue;
use crate::config::ReloadConfig;
use crate::definition::{TagFile, TagFileEntry};
use crate::source::{MemoryResourceSource, TagRequest};

pub(crate) fn id(s: &str) -> Identifier {
	Identifier::parse(s).unwrap()
}

pub(crate) fn registry_id(s: &str) -> RegistryId {
	RegistryId::new(id(s))
}

/// Builds a registry with its own event side-table.
pub(crate) fn table(name: &str, entries: &[&str]) -> Arc<EntryTable> {
	let table = EntryTable::with_events(registry_id(name), &RegistryEvents::new());
	for entry in entries {
		table.register(id(entry));
	}
	Arc::new(table)
}

pub(crate) fn names(value: &TagValue) -> Vec<String> {
	value.iter().map(|e| e.id().path().to_string()).collect()
}

pub(crate) fn elements(entries: &[&str]) -> TagFile {
	TagFile::new(entries.iter().map(|e| TagFileEntry::element(id(e))).collect())
}

pub(crate) fn client_only_dir(registry: &str) -> TagRequest {
	TagRequest::new(ReloadConfig::default().client_only_dir, registry_id(registry))
}

pub(crate) fn fallback_dir(registry: &str) -> TagRequest {
	TagRequest::new(ReloadConfig::default().fallback_dir, registry_id(registry))
}

/// Source holding the given client-only and fallback tags for `registry`.
pub(crate) fn source_with(registry: &str, client_only: &[(&str, &[&str])], fallback: &[(&str, &[&str])]) -> MemoryResourceSource {
	let source = MemoryResourceSource::new();
	for (tag, entries) in client_only {
		source.insert(&client_only_dir(registry), id(tag), elements(entries));
	}
	for (tag, entries) in fallback {
		source.insert(&fallback_dir(registry), id(tag), elements(entries));
	}
	source
}
