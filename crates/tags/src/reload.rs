//! Two-phase client tag reloads.
//!
//! Each cycle runs LOADING (one independent task per manager, joined at a
//! barrier) and then APPLYING (one blocking task per successfully loaded
//! manager, joined again). A manager whose load or apply fails keeps its
//! previous generation; other managers are unaffected.
//!
//! # Invariants
//!
//! - Cycles are serialized: a cycle starts only after the previous one has
//!   committed, so generations from different cycles never interleave.
//! - Loads run without holding any lock that lookups or commits take; only
//!   the cycle lock, which serializes whole cycles, spans the LOADING phase.

use std::fmt;
use std::sync::Arc;

use quill_registry::RegistryId;
use quill_worker::{GenerationClock, OrderedJoinSet, TaskClass};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::{JoinError, JoinHandle};

use crate::client::{ApplyStats, ClientTagManager, ClientTagManagers, RawTags};
use crate::config::ReloadConfig;
use crate::error::{ReloadError, ResourceError};
use crate::source::ResourceSource;

type LoadResult = Result<Result<RawTags, ResourceError>, JoinError>;

/// Phase in which a manager's contribution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadPhase {
	Loading,
	Applying,
}

impl fmt::Display for ReloadPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Loading => "loading",
			Self::Applying => "applying",
		})
	}
}

/// One manager's failed contribution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{phase} client tags for {registry} failed: {source}")]
pub struct ReloadFailure {
	pub registry: RegistryId,
	pub phase: ReloadPhase,
	#[source]
	pub source: ReloadError,
}

/// A manager whose new generation was committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTags {
	pub registry: RegistryId,
	pub stats: ApplyStats,
}

/// Result of one reload cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
	pub cycle: u64,
	/// Committed managers, in visitation order.
	pub applied: Vec<AppliedTags>,
	/// Failed managers, in visitation order within each phase.
	pub failures: Vec<ReloadFailure>,
}

impl ReloadReport {
	pub fn is_success(&self) -> bool {
		self.failures.is_empty()
	}

	pub fn failure_for(&self, registry: &RegistryId) -> Option<&ReloadFailure> {
		self.failures.iter().find(|f| &f.registry == registry)
	}

	fn fail(&mut self, registry: RegistryId, phase: ReloadPhase, source: ReloadError) {
		tracing::warn!(
			domain = "tags",
			cycle = self.cycle,
			registry = %registry,
			%phase,
			error = %source,
			"client tag reload failed; keeping previous generation",
		);
		self.failures.push(ReloadFailure { registry, phase, source });
	}
}

/// Drives reload cycles over every registered [`ClientTagManager`].
#[derive(Debug, Clone)]
pub struct ReloadPipeline {
	managers: Arc<ClientTagManagers>,
	config: Arc<ReloadConfig>,
	cycles: Arc<Mutex<()>>,
	clock: GenerationClock,
}

impl ReloadPipeline {
	pub fn new(managers: Arc<ClientTagManagers>, config: ReloadConfig) -> Self {
		Self {
			managers,
			config: Arc::new(config),
			cycles: Arc::new(Mutex::new(())),
			clock: GenerationClock::new(),
		}
	}

	/// Starts a cycle in the background.
	///
	/// Returns immediately; the handle resolves with the cycle's report once
	/// both phases finished for every manager.
	pub fn reload(&self, source: Arc<dyn ResourceSource>) -> JoinHandle<ReloadReport> {
		let pipeline = self.clone();
		quill_worker::spawn(TaskClass::Background, async move { pipeline.run_cycle(source).await })
	}

	/// Number of the most recently started cycle, or 0.
	pub fn last_cycle(&self) -> u64 {
		self.clock.current()
	}

	/// Runs one cycle to completion.
	pub async fn run_cycle(&self, source: Arc<dyn ResourceSource>) -> ReloadReport {
		let _serial = self.cycles.lock().await;
		let mut report = ReloadReport {
			cycle: self.clock.next(),
			..ReloadReport::default()
		};

		let mut visited: Vec<Arc<ClientTagManager>> = Vec::new();
		self.managers.for_each(|manager| visited.push(manager.clone()));
		tracing::debug!(domain = "tags", cycle = report.cycle, managers = visited.len(), "tags.reload.start");

		let loaded = self.load_all(&visited, &source).await;

		let mut applies = OrderedJoinSet::new(TaskClass::Cpu);
		let mut pending = Vec::new();
		for (manager, result) in visited.into_iter().zip(loaded) {
			let registry = manager.registry_id().clone();
			match result {
				Ok(Ok(raw)) => {
					pending.push(registry);
					applies.spawn_blocking(move || manager.apply_raw(raw));
				}
				Ok(Err(err)) => report.fail(registry, ReloadPhase::Loading, err.into()),
				Err(join) => report.fail(registry, ReloadPhase::Loading, ReloadError::from_join(join)),
			}
		}

		for (registry, result) in pending.into_iter().zip(applies.join_all().await) {
			match result {
				Ok(stats) => report.applied.push(AppliedTags { registry, stats }),
				Err(join) => report.fail(registry, ReloadPhase::Applying, ReloadError::from_join(join)),
			}
		}

		tracing::debug!(
			domain = "tags",
			cycle = report.cycle,
			applied = report.applied.len(),
			failed = report.failures.len(),
			"tags.reload.finish",
		);
		report
	}

	/// Fans out one load task per manager and waits for all of them.
	async fn load_all(&self, visited: &[Arc<ClientTagManager>], source: &Arc<dyn ResourceSource>) -> Vec<LoadResult> {
		let limiter = (self.config.max_concurrent_loads > 0).then(|| Arc::new(Semaphore::new(self.config.max_concurrent_loads)));
		let mut loads = OrderedJoinSet::new(TaskClass::Io);
		for manager in visited {
			let manager = manager.clone();
			let source = source.clone();
			let config = self.config.clone();
			let limiter = limiter.clone();
			loads.spawn(async move {
				let _permit = match limiter {
					Some(limiter) => limiter.acquire_owned().await.ok(),
					None => None,
				};
				manager.load(source.as_ref(), &config).await
			});
		}
		loads.join_all().await
	}
}

#[cfg(test)]
mod tests;
