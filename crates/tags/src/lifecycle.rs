//! Session lifecycle notifications.

use std::sync::Arc;

use parking_lot::RwLock;

/// Listener for the end of a server session (disconnect or local server stop).
pub trait SessionStopped: Send + Sync {
	fn session_stopped(&self);
}

/// Ordered set of session lifecycle listeners.
#[derive(Default)]
pub struct SessionEvents {
	stopped: RwLock<Vec<Arc<dyn SessionStopped>>>,
}

impl SessionEvents {
	pub fn new() -> Self {
		Self::default()
	}

	/// Subscribes to session stop. Listeners run in subscription order.
	pub fn on_stop(&self, listener: Arc<dyn SessionStopped>) {
		self.stopped.write().push(listener);
	}

	/// Notifies every stop listener.
	pub fn stop(&self) {
		let listeners = self.stopped.read().clone();
		tracing::debug!(domain = "tags", listeners = listeners.len(), "session.stop");
		for listener in &listeners {
			listener.session_stopped();
		}
	}

	pub fn stop_listeners(&self) -> usize {
		self.stopped.read().len()
	}
}

impl std::fmt::Debug for SessionEvents {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionEvents").field("stopped", &self.stop_listeners()).finish()
	}
}
