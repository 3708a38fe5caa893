use std::sync::Arc;

use quill_registry::{EntryTable, Identifier, RegistryEvents, RegistryId};
use quill_tags::{TagFile, TagFileEntry, TagValue};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt::try_init();
}

pub fn id(s: &str) -> Identifier {
	Identifier::parse(s).unwrap()
}

pub fn registry(name: &str, entries: &[&str]) -> Arc<EntryTable> {
	let table = EntryTable::with_events(RegistryId::new(id(name)), &RegistryEvents::new());
	for entry in entries {
		table.register(id(entry));
	}
	Arc::new(table)
}

pub fn file(entries: &[&str]) -> TagFile {
	TagFile::replacing(entries.iter().map(|e| TagFileEntry::element(id(e))).collect())
}

pub fn names(value: &TagValue) -> Vec<String> {
	value.iter().map(|e| e.id().path().to_string()).collect()
}
