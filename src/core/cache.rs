//! Identity cache: id -> position of the live entity
//!
//! The cache never owns entities. It records which collection of the
//! [`State`] an id lives in and at which index, so a lookup is a hash probe
//! plus a slice index. Removals shift indices, so every removal ends with a
//! full [`IdentityCache::rebuild`]; in-place replacement and appends keep
//! existing slots valid and only touch their own entry.

use std::collections::HashMap;

use tracing::debug;

use crate::core::entity::EntityKind;
use crate::core::error::{ModelError, ModelResult};
use crate::core::identity::EntityId;
use crate::core::state::State;

/// Where a live entity is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub kind: EntityKind,
    pub index: usize,
}

impl Slot {
    pub fn new(kind: EntityKind, index: usize) -> Self {
        Self { kind, index }
    }
}

/// Counts reported after a rebuild
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub vms: usize,
    pub groups: usize,
    pub files: usize,
}

impl CacheStats {
    pub fn total(&self) -> usize {
        self.vms + self.groups + self.files
    }
}

/// Maps every live id to its slot in the state
#[derive(Debug, Default, Clone)]
pub struct IdentityCache {
    entries: HashMap<EntityId, Slot>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh cache for `state`
    ///
    /// Fails with `DuplicateId` if two entities share an id, in which case
    /// the state cannot be used at all.
    pub fn build(state: &State) -> ModelResult<Self> {
        let mut cache = Self::new();
        cache.rebuild(state)?;
        Ok(cache)
    }

    /// Clear and re-register every entity in `state`
    pub fn rebuild(&mut self, state: &State) -> ModelResult<CacheStats> {
        self.entries.clear();

        for (index, vm) in state.vms.iter().enumerate() {
            self.register(vm.id, Slot::new(EntityKind::Vm, index), false)?;
        }
        for (index, group) in state.groups.iter().enumerate() {
            self.register(group.id, Slot::new(EntityKind::Group, index), false)?;
        }
        for (index, file) in state.files.iter().enumerate() {
            self.register(file.id, Slot::new(EntityKind::File, index), false)?;
        }

        let stats = CacheStats {
            vms: state.vms.len(),
            groups: state.groups.len(),
            files: state.files.len(),
        };
        debug!(
            vms = stats.vms,
            groups = stats.groups,
            files = stats.files,
            "identity cache rebuilt"
        );
        Ok(stats)
    }

    /// Register `slot` under `id`
    ///
    /// An existing entry is only replaced when `allow_overwrite` is set.
    pub fn register(&mut self, id: EntityId, slot: Slot, allow_overwrite: bool) -> ModelResult<()> {
        if !allow_overwrite && self.entries.contains_key(&id) {
            return Err(ModelError::DuplicateId(id));
        }
        self.entries.insert(id, slot);
        Ok(())
    }

    /// Look up the slot for `id`
    pub fn fetch(&self, id: EntityId) -> ModelResult<Slot> {
        self.entries
            .get(&id)
            .copied()
            .ok_or(ModelError::NotFound(id))
    }

    /// Look up `id` and require it to be of `kind`, returning its index
    pub fn fetch_kind(&self, id: EntityId, kind: EntityKind) -> ModelResult<usize> {
        let slot = self.fetch(id)?;
        if slot.kind != kind {
            return Err(ModelError::WrongKind {
                id,
                expected: kind,
                found: slot.kind,
            });
        }
        Ok(slot.index)
    }

    /// Largest registered id, if any
    pub fn max_id(&self) -> Option<EntityId> {
        self.entries.keys().max().copied()
    }
}
