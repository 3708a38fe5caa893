use std::future::Future;

use rustc_hash::FxHashMap;
use tokio::runtime::Handle;
use tokio::task::{Id, JoinError, JoinSet};

use crate::TaskClass;
use crate::spawn::runtime_handle;

/// Fan-out/fan-in set of independent tasks whose results come back in spawn order.
///
/// Each task runs on its own, so a slow or panicking task only affects its own
/// slot. [`Self::join_all`] is the barrier: it resolves once every task has
/// finished and yields one result per spawn, indexed like the spawns were.
#[derive(Debug)]
pub struct OrderedJoinSet<T> {
	class: TaskClass,
	handle: Handle,
	inner: JoinSet<T>,
	slots: FxHashMap<Id, usize>,
}

impl<T> OrderedJoinSet<T>
where
	T: Send + 'static,
{
	/// Creates an empty set bound to the current worker runtime.
	pub fn new(class: TaskClass) -> Self {
		Self {
			class,
			handle: runtime_handle(),
			inner: JoinSet::new(),
			slots: FxHashMap::default(),
		}
	}

	/// Returns the number of tasks spawned and not yet joined.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Returns `true` if no task is pending.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Spawns an async task and returns its slot index.
	pub fn spawn<F>(&mut self, fut: F) -> usize
	where
		F: Future<Output = T> + Send + 'static,
	{
		let slot = self.slots.len();
		tracing::trace!(worker_class = self.class.as_str(), slot, "worker.join_set.spawn");
		let abort = self.inner.spawn_on(fut, &self.handle);
		self.slots.insert(abort.id(), slot);
		slot
	}

	/// Spawns blocking work and returns its slot index.
	pub fn spawn_blocking<F>(&mut self, f: F) -> usize
	where
		F: FnOnce() -> T + Send + 'static,
	{
		let slot = self.slots.len();
		tracing::trace!(worker_class = self.class.as_str(), slot, "worker.join_set.spawn_blocking");
		let abort = self.inner.spawn_blocking_on(f, &self.handle);
		self.slots.insert(abort.id(), slot);
		slot
	}

	/// Waits for every task and returns their results in spawn order.
	pub async fn join_all(mut self) -> Vec<Result<T, JoinError>> {
		let mut done = Vec::with_capacity(self.slots.len());
		while let Some(joined) = self.inner.join_next_with_id().await {
			let (id, result) = match joined {
				Ok((id, value)) => (id, Ok(value)),
				Err(err) => (err.id(), Err(err)),
			};
			if let Some(&slot) = self.slots.get(&id) {
				done.push((slot, result));
			}
		}
		done.sort_by_key(|(slot, _)| *slot);
		done.into_iter().map(|(_, result)| result).collect()
	}
}
