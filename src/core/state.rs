//! The root of the model: every VM, group and file

use serde::{Deserialize, Serialize};

use crate::core::identity::EntityId;
use crate::entities::{File, Group, Vm};

/// A full model of the inventory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Display name
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub vms: Vec<Vm>,

    #[serde(default)]
    pub groups: Vec<Group>,

    #[serde(default)]
    pub files: Vec<File>,
}

impl State {
    /// Create an empty state
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Total number of entities
    pub fn len(&self) -> usize {
        self.vms.len() + self.groups.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entity id, VMs first, then groups, then files
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.vms
            .iter()
            .map(|v| v.id)
            .chain(self.groups.iter().map(|g| g.id))
            .chain(self.files.iter().map(|f| f.id))
    }

    /// Parse a state from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
