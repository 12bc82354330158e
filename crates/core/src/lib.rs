pub mod audit;
pub mod codegen;
pub mod config;
pub mod hub;
pub mod lifecycle;
pub mod queue;
pub mod redirect;
pub mod sector;
pub mod service;
pub mod turn;

pub use codegen::{CodeGenError, CodeGenerator, SqliteCodeGenerator};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use hub::{EventEnvelope, EventHub, QueueEvent};
pub use lifecycle::{InvalidTransition, TurnAction};
pub use sector::{Sector, SectorError, SectorStore, SqliteSectorStore};
pub use service::{CreateTurnRequest, ServiceError, TurnService};
pub use turn::{SqliteTurnStore, Turn, TurnError, TurnKind, TurnState, TurnStore};
