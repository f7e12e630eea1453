//! Entity trait - common interface for all entity types

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

use crate::core::identity::EntityId;
use crate::entities::{File, Group, Vm};

/// Common trait for all vmanager entities
pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// Which collection this entity lives in
    const KIND: EntityKind;

    /// Get the entity's unique ID
    fn id(&self) -> EntityId;

    /// Replace the entity's ID (used when an add assigns a fresh one)
    fn set_id(&mut self, id: EntityId);

    /// Get the entity's display name
    fn name(&self) -> &str;
}

/// The three kinds of entity sharing the id space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Vm,
    Group,
    File,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Vm => "vm",
            EntityKind::Group => "group",
            EntityKind::File => "file",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vm" => Ok(EntityKind::Vm),
            "group" => Ok(EntityKind::Group),
            "file" => Ok(EntityKind::File),
            _ => Err(format!("Unknown entity kind: {}", s)),
        }
    }
}

/// An owned copy of any entity, as returned by `Manager::resolve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnyEntity {
    Vm(Vm),
    Group(Group),
    File(File),
}

impl AnyEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            AnyEntity::Vm(_) => EntityKind::Vm,
            AnyEntity::Group(_) => EntityKind::Group,
            AnyEntity::File(_) => EntityKind::File,
        }
    }

    pub fn id(&self) -> EntityId {
        match self {
            AnyEntity::Vm(vm) => vm.id,
            AnyEntity::Group(g) => g.id,
            AnyEntity::File(f) => f.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AnyEntity::Vm(vm) => &vm.name,
            AnyEntity::Group(g) => &g.name,
            AnyEntity::File(f) => &f.name,
        }
    }

    pub fn into_vm(self) -> Option<Vm> {
        match self {
            AnyEntity::Vm(vm) => Some(vm),
            _ => None,
        }
    }

    pub fn into_group(self) -> Option<Group> {
        match self {
            AnyEntity::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn into_file(self) -> Option<File> {
        match self {
            AnyEntity::File(f) => Some(f),
            _ => None,
        }
    }
}
