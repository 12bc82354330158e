//! Sector registry: the service counters turns are queued against.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteSectorStore;
pub use store::{SectorError, SectorStore};
pub use types::Sector;
