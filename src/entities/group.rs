//! Group entity type

use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, EntityKind};
use crate::core::identity::EntityId;

/// A named collection of VMs and/or other groups
///
/// Groups may not contain themselves, directly or through nested groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier
    pub id: EntityId,

    /// Display name
    pub name: String,

    /// Ids of contained VMs and groups
    #[serde(default)]
    pub members: Vec<EntityId>,
}

impl Entity for Group {
    const KIND: EntityKind = EntityKind::Group;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Group {
    /// Create an empty group; the id is assigned when it is added to a model
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::default(),
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_members(mut self, members: impl IntoIterator<Item = EntityId>) -> Self {
        self.members = members.into_iter().collect();
        self
    }
}

/// Partial-match filter for groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFilter {
    pub id: Option<EntityId>,
    pub name: Option<String>,
    /// Compared as a set
    pub members: Option<Vec<EntityId>>,
    /// Only requires the id to be among the members
    pub contains: Option<EntityId>,
}

impl GroupFilter {
    pub fn matches(&self, group: &Group) -> bool {
        self.id.map_or(true, |id| id == group.id)
            && self.name.as_ref().map_or(true, |n| *n == group.name)
            && self
                .members
                .as_ref()
                .map_or(true, |m| crate::core::links::same_set(m, &group.members))
            && self.contains.map_or(true, |id| group.members.contains(&id))
    }
}
