//! Turn domain types and storage.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTurnStore;
pub use store::{TurnError, TurnStore};
pub use types::{Turn, TurnKind, TurnState};
