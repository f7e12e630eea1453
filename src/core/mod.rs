//! Core module - the inventory model and its persistence

pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod generator;
pub mod identity;
pub mod links;
pub mod manager;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod workspace;

pub use cache::{CacheStats, IdentityCache, Slot};
pub use config::Config;
pub use entity::{AnyEntity, Entity, EntityKind};
pub use error::{ModelError, ModelResult};
pub use generator::GeneratorSizes;
pub use identity::{EntityId, IdAllocator, IdParseError};
pub use links::MembershipDiff;
pub use manager::Manager;
pub use snapshot::Snapshots;
pub use state::State;
pub use store::{KvStore, MemoryStore, SqliteStore};
pub use workspace::{Workspace, WorkspaceError};
