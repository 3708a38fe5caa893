//! Worker primitives for running tag reload phases off the calling thread.
//!
//! - [`spawn`]: classified task spawns on the ambient runtime (or a shared
//!   fallback runtime)
//! - [`OrderedJoinSet`]: independent tasks joined at a barrier, results in
//!   spawn order
//! - [`GenerationClock`]: monotonic cycle numbering

mod class;
mod clock;
mod join_set;
mod panic;
mod spawn;

pub use class::TaskClass;
pub use clock::GenerationClock;
pub use join_set::OrderedJoinSet;
pub use panic::join_error_panic_message;
pub use spawn::spawn;
