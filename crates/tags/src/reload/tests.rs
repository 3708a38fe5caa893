use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use quill_registry::{EntryRef, Identifier, ObjectRegistry};

use super::*;
use crate::config::TagsConfig;
use crate::definition::TagFile;
use crate::source::{MemoryResourceSource, TagRequest};
use crate::test_fixtures::{client_only_dir, elements, id, names, registry_id, table};
use crate::{TagResolver, TagValue};

fn client_value(resolver: &TagResolver, registry: &str, tag: &str) -> TagValue {
	let key = resolver.classifier().key(&registry_id(registry), &id(tag)).unwrap();
	resolver.resolve(&key)
}

fn source(defs: &[(&str, &str, &[&str])]) -> Arc<MemoryResourceSource> {
	let source = MemoryResourceSource::new();
	for (registry, tag, entries) in defs {
		source.insert(&client_only_dir(registry), id(tag), elements(entries));
	}
	Arc::new(source)
}

/// Registry whose lookups panic, to fail the applying phase.
struct Exploding(RegistryId);

impl ObjectRegistry for Exploding {
	fn id(&self) -> &RegistryId {
		&self.0
	}

	fn is_dynamic(&self) -> bool {
		false
	}

	fn get(&self, _: &Identifier) -> Option<EntryRef> {
		panic!("registry exploded")
	}
}

/// Source wrapper that records how many listings run at once.
struct Gauge {
	inner: Arc<MemoryResourceSource>,
	in_flight: AtomicUsize,
	peak: AtomicUsize,
	barrier: Option<tokio::sync::Barrier>,
}

impl Gauge {
	fn new(inner: Arc<MemoryResourceSource>, barrier: Option<usize>) -> Self {
		Self {
			inner,
			in_flight: AtomicUsize::new(0),
			peak: AtomicUsize::new(0),
			barrier: barrier.map(tokio::sync::Barrier::new),
		}
	}
}

#[async_trait]
impl ResourceSource for Gauge {
	async fn list(&self, request: &TagRequest) -> Result<Vec<Identifier>, ResourceError> {
		let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.peak.fetch_max(now, Ordering::SeqCst);
		if let Some(barrier) = &self.barrier {
			barrier.wait().await;
		} else {
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		self.in_flight.fetch_sub(1, Ordering::SeqCst);
		self.inner.list(request).await
	}

	async fn read(&self, request: &TagRequest, tag: &Identifier) -> Result<Vec<TagFile>, ResourceError> {
		self.inner.read(request, tag).await
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cycle_commits_every_manager() {
	let resolver = TagResolver::default();
	resolver.track_registry(table("block", &["stone"]));
	resolver.track_registry(table("item", &["stick"]));
	let source = source(&[("block", "local", &["stone"]), ("item", "local", &["stick"])]);

	let report = resolver.reload(source).await.unwrap();
	assert!(report.is_success());
	assert_eq!(report.cycle, 1);
	let applied: Vec<_> = report.applied.iter().map(|a| a.registry.to_string()).collect();
	assert_eq!(applied, vec!["quill:block", "quill:item"]);
	assert_eq!(names(&client_value(&resolver, "block", "local")), vec!["stone"]);
	assert_eq!(names(&client_value(&resolver, "item", "local")), vec!["stick"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn load_failure_keeps_previous_generation() {
	let resolver = TagResolver::default();
	resolver.track_registry(table("block", &["stone", "dirt"]));
	resolver.track_registry(table("item", &["stick", "bone"]));
	let source = source(&[("block", "local", &["stone"]), ("item", "local", &["stick"])]);
	assert!(resolver.reload(source.clone()).await.unwrap().is_success());

	source.insert(&client_only_dir("block"), id("local"), TagFile::replacing(vec![crate::TagFileEntry::element(id("dirt"))]));
	source.insert(&client_only_dir("item"), id("local"), TagFile::replacing(vec![crate::TagFileEntry::element(id("bone"))]));
	source.set_failing(&client_only_dir("block"), true);

	let report = resolver.reload(source).await.unwrap();
	assert_eq!(report.cycle, 2);
	let failure = report.failure_for(&registry_id("block")).unwrap();
	assert_eq!(failure.phase, ReloadPhase::Loading);
	assert!(matches!(failure.source, ReloadError::Resource(ResourceError::List { .. })));
	assert_eq!(report.applied.len(), 1);

	assert_eq!(names(&client_value(&resolver, "block", "local")), vec!["stone"]);
	assert_eq!(names(&client_value(&resolver, "item", "local")), vec!["bone"]);
	assert_eq!(resolver.managers().get(&registry_id("block")).unwrap().generation(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn apply_panic_is_isolated() {
	let resolver = TagResolver::default();
	resolver.track_registry(Arc::new(Exploding(registry_id("broken"))));
	resolver.track_registry(table("item", &["stick"]));
	let source = source(&[("broken", "local", &["anything"]), ("item", "local", &["stick"])]);

	let report = resolver.reload(source).await.unwrap();
	let failure = report.failure_for(&registry_id("broken")).unwrap();
	assert_eq!(failure.phase, ReloadPhase::Applying);
	assert_eq!(failure.source, ReloadError::Panicked("registry exploded".to_string()));
	assert_eq!(names(&client_value(&resolver, "item", "local")), vec!["stick"]);
	assert_eq!(resolver.managers().get(&registry_id("broken")).unwrap().generation(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn loads_run_concurrently() {
	let resolver = TagResolver::default();
	resolver.track_registry(table("block", &[]));
	resolver.track_registry(table("item", &[]));
	// Each manager lists two directories; the first listings of both managers
	// must be in flight together to pass the barrier.
	let gauge = Arc::new(Gauge::new(Arc::new(MemoryResourceSource::new()), Some(2)));

	let report = tokio::time::timeout(Duration::from_secs(5), resolver.reload(gauge.clone()))
		.await
		.expect("loads did not overlap")
		.unwrap();
	assert!(report.is_success());
	assert_eq!(gauge.peak.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn configured_limit_bounds_loads() {
	let config = TagsConfig::from_toml_str("[reload]\nmax_concurrent_loads = 1\n").unwrap();
	let resolver = TagResolver::new(config);
	for name in ["block", "item", "fluid"] {
		resolver.track_registry(table(name, &[]));
	}
	let gauge = Arc::new(Gauge::new(Arc::new(MemoryResourceSource::new()), None));

	let report = resolver.reload(gauge.clone()).await.unwrap();
	assert_eq!(report.applied.len(), 3);
	assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_cycles_are_serialized() {
	let resolver = TagResolver::default();
	let manager = resolver.track_registry(table("block", &["stone"]));
	let source = source(&[("block", "local", &["stone"])]);

	let first = resolver.reload(source.clone());
	let second = resolver.reload(source);
	let mut cycles = vec![first.await.unwrap().cycle, second.await.unwrap().cycle];
	cycles.sort_unstable();
	assert_eq!(cycles, vec![1, 2]);
	assert_eq!(manager.generation(), 2);
	assert_eq!(resolver.pipeline().last_cycle(), 2);
}

#[tokio::test]
async fn cycle_without_managers_is_empty() {
	let resolver = TagResolver::default();
	let report = resolver.pipeline().run_cycle(Arc::new(MemoryResourceSource::new())).await;
	assert_eq!(report, ReloadReport { cycle: 1, ..ReloadReport::default() });
}
