//! Client-side tag data: locally resolved client-only tags and
//! client-fallback defaults, one manager per registry.

mod manager;
mod managers;

pub use manager::{ApplyStats, ClientTagManager, ClientTagView, RawTags};
pub use managers::ClientTagManagers;
