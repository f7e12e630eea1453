//! Errors raised by model operations

use thiserror::Error;

use crate::core::entity::EntityKind;
use crate::core::identity::EntityId;

/// Errors that can occur while reading or mutating the model
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("ID not found: {0}")]
    NotFound(EntityId),

    #[error("no snapshot stored under token '{0}'")]
    SnapshotNotFound(String),

    #[error("duplicate ID {0}")]
    DuplicateId(EntityId),

    #[error("ID {id} is a {found}, expected a {expected}")]
    WrongKind {
        id: EntityId,
        expected: EntityKind,
        found: EntityKind,
    },

    #[error("adding {member} to group {group} would make the group contain itself")]
    Cycle { group: EntityId, member: EntityId },

    #[error("no token specified and the snapshot stack is empty")]
    EmptyStack,

    #[error("internal consistency error: {0}")]
    InternalConsistency(String),

    #[error("state is inconsistent: {}", .0.join("; "))]
    Inconsistent(Vec<String>),

    #[error("snapshot storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// True for both entity and snapshot lookups that came up empty
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound(_) | ModelError::SnapshotNotFound(_))
    }
}

pub type ModelResult<T> = std::result::Result<T, ModelError>;
