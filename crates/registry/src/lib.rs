//! Object registry surface consumed by the tag engine.
//!
//! - [`Identifier`]: validated `namespace:path` names
//! - [`RegistryId`] / [`EntryRef`]: registry identity and entry references
//! - [`ObjectRegistry`]: the read surface tags resolve against
//! - [`EntryTable`]: in-memory registry with atomic snapshot publication
//! - [`RegistryEvents`]: side-table of per-registry event hubs

mod entry;
mod error;
pub mod events;
mod identifier;
mod table;

pub use entry::{EntryRef, ObjectRegistry, RegistryId};
pub use error::IdentifierError;
pub use events::{RegistryEventHub, RegistryEvents};
pub use identifier::{DEFAULT_NAMESPACE, Identifier};
pub use table::EntryTable;
