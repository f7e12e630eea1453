//! The model handle: state, identity cache, id counter and snapshots
//!
//! Every public operation of the inventory lives on [`Manager`]. Reads hand
//! out owned copies; writes go through the membership bookkeeping so that a
//! VM's `groups` and a group's `members` never disagree.
//!
//! Mutations check every referenced id before changing anything, so a
//! failed call leaves the state exactly as it was.

use tracing::{debug, info};

use crate::core::cache::{IdentityCache, Slot};
use crate::core::entity::{AnyEntity, Entity, EntityKind};
use crate::core::error::{ModelError, ModelResult};
use crate::core::generator::{self, GeneratorSizes};
use crate::core::identity::{EntityId, IdAllocator};
use crate::core::links::{self, MembershipDiff};
use crate::core::snapshot::Snapshots;
use crate::core::state::State;
use crate::core::store::{KvStore, MemoryStore};
use crate::entities::{File, FileFilter, Group, GroupFilter, Vm, VmFilter};

/// An inventory and everything needed to keep it consistent
pub struct Manager<S: KvStore = MemoryStore> {
    state: State,
    cache: IdentityCache,
    ids: IdAllocator,
    snapshots: Snapshots<S>,
    sizes: GeneratorSizes,
}

impl Manager<MemoryStore> {
    /// A manager whose snapshots live only as long as the process
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: KvStore> Manager<S> {
    /// Create a manager with an empty state
    ///
    /// Call [`Manager::init`] before using it.
    pub fn new(store: S) -> Self {
        Self {
            state: State::default(),
            cache: IdentityCache::new(),
            ids: IdAllocator::new(),
            snapshots: Snapshots::new(store),
            sizes: GeneratorSizes::default(),
        }
    }

    /// Set how much data `init(None)` generates
    pub fn with_generator_sizes(mut self, sizes: GeneratorSizes) -> Self {
        self.sizes = sizes;
        self
    }

    // =====================================================================
    // Whole-state replacement
    // =====================================================================

    /// Replace the state with `state`, or with a freshly generated one
    pub fn init(&mut self, state: Option<State>) -> ModelResult<()> {
        let state = match state {
            Some(state) => state,
            None => generator::populate(&mut self.ids, self.sizes),
        };
        self.replace_state(state)
    }

    /// Validate `state`, then make it the live state with a rebuilt cache
    ///
    /// A state with duplicate ids or broken references is refused and the
    /// current state stays live.
    fn replace_state(&mut self, state: State) -> ModelResult<()> {
        let cache = IdentityCache::build(&state)?;
        let problems = links::integrity_violations(&state);
        if !problems.is_empty() {
            return Err(ModelError::Inconsistent(problems));
        }

        if let Some(max) = cache.max_id() {
            self.ids.advance_past(max);
        }
        info!(
            name = %state.name,
            vms = state.vms.len(),
            groups = state.groups.len(),
            files = state.files.len(),
            "state replaced"
        );
        self.state = state;
        self.cache = cache;
        Ok(())
    }

    /// Rebuild the cache after a removal shifted positions
    fn rebuild_cache(&mut self) -> ModelResult<()> {
        self.cache.rebuild(&self.state)?;
        Ok(())
    }

    // =====================================================================
    // Reads
    // =====================================================================

    /// Borrow the live state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Owned copy of the whole state
    pub fn export_state(&self) -> State {
        self.state.clone()
    }

    /// Rename the live state
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.state.name = name.into();
    }

    /// The id the next add will receive
    pub fn next_id(&self) -> EntityId {
        self.ids.peek()
    }

    /// Never hand out ids below `next`
    pub fn reserve_ids_below(&mut self, next: EntityId) {
        if next.get() > 0 {
            self.ids.advance_past(EntityId::new(next.get() - 1));
        }
    }

    /// Copy of the entity with `id`, whatever its kind
    pub fn resolve(&self, id: EntityId) -> ModelResult<AnyEntity> {
        let slot = self.cache.fetch(id)?;
        Ok(match slot.kind {
            EntityKind::Vm => AnyEntity::Vm(self.state.vms[slot.index].clone()),
            EntityKind::Group => AnyEntity::Group(self.state.groups[slot.index].clone()),
            EntityKind::File => AnyEntity::File(self.state.files[slot.index].clone()),
        })
    }

    pub fn get_vm(&self, id: EntityId) -> ModelResult<Vm> {
        let index = self.cache.fetch_kind(id, EntityKind::Vm)?;
        Ok(self.state.vms[index].clone())
    }

    pub fn get_group(&self, id: EntityId) -> ModelResult<Group> {
        let index = self.cache.fetch_kind(id, EntityKind::Group)?;
        Ok(self.state.groups[index].clone())
    }

    pub fn get_file(&self, id: EntityId) -> ModelResult<File> {
        let index = self.cache.fetch_kind(id, EntityKind::File)?;
        Ok(self.state.files[index].clone())
    }

    /// Copies of the VMs matching `filter` (all of them with `None`)
    pub fn get_vms(&self, filter: Option<&VmFilter>) -> Vec<Vm> {
        self.state
            .vms
            .iter()
            .filter(|vm| filter.map_or(true, |f| f.matches(vm)))
            .cloned()
            .collect()
    }

    /// Copies of the groups matching `filter`
    pub fn get_groups(&self, filter: Option<&GroupFilter>) -> Vec<Group> {
        self.state
            .groups
            .iter()
            .filter(|g| filter.map_or(true, |f| f.matches(g)))
            .cloned()
            .collect()
    }

    /// Copies of the files matching `filter`
    pub fn get_files(&self, filter: Option<&FileFilter>) -> Vec<File> {
        self.state
            .files
            .iter()
            .filter(|file| filter.map_or(true, |f| f.matches(file)))
            .cloned()
            .collect()
    }

    /// Groups that list `id` among their members
    pub fn groups_containing(&self, id: EntityId) -> Vec<Group> {
        self.get_groups(Some(&GroupFilter {
            contains: Some(id),
            ..Default::default()
        }))
    }

    /// VMs that reference file `id` as iso, disk or memory
    pub fn vms_using_file(&self, id: EntityId) -> Vec<Vm> {
        self.state
            .vms
            .iter()
            .filter(|vm| vm.file_refs().any(|f| f == id))
            .cloned()
            .collect()
    }

    /// Every broken reference in the live state
    pub fn check_integrity(&self) -> Vec<String> {
        links::integrity_violations(&self.state)
    }

    // =====================================================================
    // Validation shared by adds and sets
    // =====================================================================

    fn validate_vm_refs(&self, vm: &Vm) -> ModelResult<()> {
        for group in &vm.groups {
            self.cache.fetch_kind(*group, EntityKind::Group)?;
        }
        for file in vm.file_refs() {
            self.cache.fetch_kind(file, EntityKind::File)?;
        }
        Ok(())
    }

    fn validate_members(&self, group: EntityId, members: &[EntityId]) -> ModelResult<()> {
        for member in members {
            let slot = self.cache.fetch(*member)?;
            if slot.kind == EntityKind::File {
                return Err(ModelError::WrongKind {
                    id: *member,
                    expected: EntityKind::Vm,
                    found: EntityKind::File,
                });
            }
        }
        if let Some(member) = links::find_cycle(&self.state.groups, group, members) {
            return Err(ModelError::Cycle { group, member });
        }
        Ok(())
    }

    /// Give a new entity a fresh id and register it at `index` of its collection
    fn admit<E: Entity>(&mut self, entity: &mut E, index: usize) -> ModelResult<()> {
        entity.set_id(self.ids.allocate());
        self.cache
            .register(entity.id(), Slot::new(E::KIND, index), false)
    }

    fn group_mut(&mut self, id: EntityId) -> ModelResult<&mut Group> {
        let index = self.cache.fetch_kind(id, EntityKind::Group)?;
        Ok(&mut self.state.groups[index])
    }

    // =====================================================================
    // VMs
    // =====================================================================

    /// Add a VM under a fresh id and join it to its listed groups
    pub fn add_vm(&mut self, mut vm: Vm) -> ModelResult<Vm> {
        links::dedup(&mut vm.groups);
        self.validate_vm_refs(&vm)?;

        self.admit(&mut vm, self.state.vms.len())?;
        for group in vm.groups.clone() {
            links::push_unique(&mut self.group_mut(group)?.members, vm.id);
        }
        self.state.vms.push(vm.clone());

        info!(id = %vm.id, name = %vm.name, "vm added");
        Ok(vm)
    }

    /// Replace the VM with the same id, moving it between groups as needed
    pub fn set_vm(&mut self, mut vm: Vm) -> ModelResult<Vm> {
        let index = self.cache.fetch_kind(vm.id, EntityKind::Vm)?;
        links::dedup(&mut vm.groups);
        self.validate_vm_refs(&vm)?;

        let diff = MembershipDiff::between(&self.state.vms[index].groups, &vm.groups);
        debug!(id = %vm.id, dropped = ?diff.dropped, joined = ?diff.joined, "vm membership diff");

        for group in &diff.dropped {
            links::strip(&mut self.group_mut(*group)?.members, vm.id);
        }
        for group in &diff.joined {
            links::push_unique(&mut self.group_mut(*group)?.members, vm.id);
        }

        self.state.vms[index] = vm.clone();
        self.cache
            .register(vm.id, Slot::new(EntityKind::Vm, index), true)?;

        info!(id = %vm.id, name = %vm.name, "vm updated");
        Ok(vm)
    }

    /// Remove a VM and every membership that mentions it
    pub fn rm_vm(&mut self, id: EntityId) -> ModelResult<()> {
        self.cache.fetch_kind(id, EntityKind::Vm)?;

        let before = self.state.vms.len();
        self.state.vms.retain(|vm| vm.id != id);
        let removed = before - self.state.vms.len();
        if removed != 1 {
            return Err(ModelError::InternalConsistency(format!(
                "expected 1 removal of vm {}, but did {}",
                id, removed
            )));
        }

        for group in &mut self.state.groups {
            links::strip(&mut group.members, id);
        }

        self.rebuild_cache()?;
        info!(id = %id, "vm removed");
        Ok(())
    }

    // =====================================================================
    // Groups
    // =====================================================================

    /// Add a group under a fresh id and add it to its member VMs
    pub fn add_group(&mut self, mut group: Group) -> ModelResult<Group> {
        links::dedup(&mut group.members);

        let id = self.ids.peek();
        self.validate_members(id, &group.members)?;
        self.admit(&mut group, self.state.groups.len())?;

        for member in &group.members {
            if let Ok(index) = self.cache.fetch_kind(*member, EntityKind::Vm) {
                links::push_unique(&mut self.state.vms[index].groups, group.id);
            }
        }
        self.state.groups.push(group.clone());

        info!(id = %group.id, name = %group.name, "group added");
        Ok(group)
    }

    /// Replace the group with the same id, updating member VMs as needed
    pub fn set_group(&mut self, mut group: Group) -> ModelResult<Group> {
        let index = self.cache.fetch_kind(group.id, EntityKind::Group)?;
        links::dedup(&mut group.members);
        self.validate_members(group.id, &group.members)?;

        let diff = MembershipDiff::between(&self.state.groups[index].members, &group.members);
        debug!(id = %group.id, dropped = ?diff.dropped, joined = ?diff.joined, "group membership diff");

        for member in &diff.dropped {
            if let Ok(vm) = self.cache.fetch_kind(*member, EntityKind::Vm) {
                links::strip(&mut self.state.vms[vm].groups, group.id);
            }
        }
        for member in &diff.joined {
            if let Ok(vm) = self.cache.fetch_kind(*member, EntityKind::Vm) {
                links::push_unique(&mut self.state.vms[vm].groups, group.id);
            }
        }

        self.state.groups[index] = group.clone();
        self.cache
            .register(group.id, Slot::new(EntityKind::Group, index), true)?;

        info!(id = %group.id, name = %group.name, "group updated");
        Ok(group)
    }

    /// Remove a group and every reference to it
    pub fn rm_group(&mut self, id: EntityId) -> ModelResult<()> {
        self.cache.fetch_kind(id, EntityKind::Group)?;

        let before = self.state.groups.len();
        self.state.groups.retain(|g| g.id != id);
        let removed = before - self.state.groups.len();
        if removed != 1 {
            return Err(ModelError::InternalConsistency(format!(
                "expected 1 removal of group {}, but did {}",
                id, removed
            )));
        }

        for vm in &mut self.state.vms {
            links::strip(&mut vm.groups, id);
        }
        for group in &mut self.state.groups {
            links::strip(&mut group.members, id);
        }

        self.rebuild_cache()?;
        info!(id = %id, "group removed");
        Ok(())
    }

    // =====================================================================
    // Files
    // =====================================================================

    /// Add an immutable file under a fresh id
    pub fn add_file(&mut self, mut file: File) -> ModelResult<File> {
        self.admit(&mut file, self.state.files.len())?;
        self.state.files.push(file.clone());

        info!(id = %file.id, name = %file.name, "file added");
        Ok(file)
    }

    // =====================================================================
    // Snapshots
    // =====================================================================

    /// Save the live state and return its token
    pub fn save_state(&mut self) -> ModelResult<String> {
        self.snapshots.save(&self.state)
    }

    /// Restore a saved state
    ///
    /// With no token, the most recently saved snapshot is popped off the
    /// stack. The stack only changes if the restore succeeds.
    pub fn restore_state(&mut self, token: Option<&str>) -> ModelResult<()> {
        let pending = self.snapshots.select(token)?;
        let state = self.snapshots.load(&pending.token)?;
        self.replace_state(state)?;
        self.snapshots.commit(&pending)?;

        info!(token = %pending.token, popped = pending.popped, "snapshot restored");
        Ok(())
    }

    /// Saved tokens, oldest first
    pub fn snapshot_tokens(&self) -> ModelResult<Vec<String>> {
        self.snapshots.tokens()
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.snapshots.store_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{FileType, VmState};
    use rand::rngs::StdRng;
    use rand::seq::IndexedRandom;
    use rand::{Rng, SeedableRng};

    fn id(raw: u64) -> EntityId {
        EntityId::new(raw)
    }

    /// VM 1 with no groups, group 2 with no members
    fn scenario_state() -> State {
        let mut vm = Vm::new("v");
        vm.id = id(1);
        let mut group = Group::new("G");
        group.id = id(2);
        State {
            name: "t".into(),
            vms: vec![vm],
            groups: vec![group],
            files: vec![],
        }
    }

    fn manager() -> Manager {
        let mut m = Manager::in_memory();
        m.init(Some(scenario_state())).unwrap();
        m
    }

    fn assert_symmetric(m: &Manager) {
        assert!(m.check_integrity().is_empty(), "{:?}", m.check_integrity());
        for vm in m.get_vms(None) {
            for group in m.get_groups(None) {
                assert_eq!(
                    vm.groups.contains(&group.id),
                    group.members.contains(&vm.id),
                    "vm {} / group {}",
                    vm.id,
                    group.id
                );
            }
        }
    }

    fn pick_some(rng: &mut StdRng, pool: &[EntityId]) -> Vec<EntityId> {
        pool.iter().copied().filter(|_| rng.random_bool(0.3)).collect()
    }

    #[test]
    fn test_random_operations_keep_membership_symmetric() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut ids = IdAllocator::new();
        let sizes = GeneratorSizes {
            vms: 12,
            groups: 5,
            files: 6,
        };
        let state = generator::populate_with(&mut rng, &mut ids, sizes);

        let mut m = Manager::in_memory();
        m.init(Some(state)).unwrap();
        assert_symmetric(&m);

        for step in 0..300 {
            let vm_ids: Vec<EntityId> = m.get_vms(None).iter().map(|vm| vm.id).collect();
            let group_ids: Vec<EntityId> = m.get_groups(None).iter().map(|g| g.id).collect();

            match rng.random_range(0..6) {
                0 => {
                    let mut vm = Vm::new(format!("vm-{step}"));
                    vm.groups = pick_some(&mut rng, &group_ids);
                    m.add_vm(vm).unwrap();
                }
                1 => {
                    if let Some(&target) = vm_ids.choose(&mut rng) {
                        let mut vm = m.get_vm(target).unwrap();
                        vm.groups = pick_some(&mut rng, &group_ids);
                        m.set_vm(vm).unwrap();
                    }
                }
                2 => {
                    if let Some(&target) = vm_ids.choose(&mut rng) {
                        m.rm_vm(target).unwrap();
                    }
                }
                3 => {
                    let members = pick_some(&mut rng, &vm_ids);
                    m.add_group(Group::new(format!("g-{step}")).with_members(members))
                        .unwrap();
                }
                4 => {
                    if let Some(&target) = group_ids.choose(&mut rng) {
                        let mut group = m.get_group(target).unwrap();
                        group.members = pick_some(&mut rng, &vm_ids);
                        m.set_group(group).unwrap();
                    }
                }
                _ => {
                    if let Some(&target) = group_ids.choose(&mut rng) {
                        m.rm_group(target).unwrap();
                    }
                }
            }
            assert_symmetric(&m);
        }
    }

    #[test]
    fn test_set_vm_joins_group() {
        let mut m = manager();
        let mut vm = m.get_vm(id(1)).unwrap();
        vm.groups = vec![id(2)];
        m.set_vm(vm).unwrap();

        let group = m.resolve(id(2)).unwrap().into_group().unwrap();
        assert_eq!(group.members, vec![id(1)]);
        assert_symmetric(&m);
    }

    #[test]
    fn test_set_vm_leaves_group() {
        let mut m = manager();
        let mut vm = m.get_vm(id(1)).unwrap();
        vm.groups = vec![id(2)];
        m.set_vm(vm.clone()).unwrap();

        vm.groups.clear();
        m.set_vm(vm).unwrap();
        assert!(m.get_group(id(2)).unwrap().members.is_empty());
        assert_symmetric(&m);
    }

    #[test]
    fn test_set_vm_replaces_every_field() {
        let mut m = manager();
        let mut vm = Vm::new("renamed");
        vm.id = id(1);
        vm.ram = 64;
        vm.state = VmState::Suspended;
        m.set_vm(vm.clone()).unwrap();
        assert_eq!(m.get_vm(id(1)).unwrap(), vm);
    }

    #[test]
    fn test_set_vm_unknown_id() {
        let mut m = manager();
        let mut vm = Vm::new("ghost");
        vm.id = id(40);
        assert!(matches!(m.set_vm(vm), Err(ModelError::NotFound(_))));
    }

    #[test]
    fn test_set_vm_with_missing_group_changes_nothing() {
        let mut m = manager();
        let before = m.export_state();

        let mut vm = m.get_vm(id(1)).unwrap();
        vm.name = "changed".into();
        vm.groups = vec![id(2), id(99)];
        assert!(matches!(m.set_vm(vm), Err(ModelError::NotFound(_))));
        assert_eq!(m.export_state(), before);
    }

    #[test]
    fn test_set_vm_group_must_be_a_group() {
        let mut m = manager();
        let other = m.add_vm(Vm::new("other")).unwrap();
        let mut vm = m.get_vm(id(1)).unwrap();
        vm.groups = vec![other.id];
        assert!(matches!(
            m.set_vm(vm),
            Err(ModelError::WrongKind {
                expected: EntityKind::Group,
                found: EntityKind::Vm,
                ..
            })
        ));
    }

    #[test]
    fn test_add_vm_assigns_increasing_fresh_ids() {
        let mut m = manager();
        let mut input = Vm::new("x");
        input.id = id(1);

        let first = m.add_vm(input.clone()).unwrap();
        let second = m.add_vm(input).unwrap();

        assert!(first.id > id(2));
        assert!(second.id > first.id);
        assert_eq!(m.get_vms(None).len(), 3);
    }

    #[test]
    fn test_add_vm_backfills_groups() {
        let mut m = manager();
        let mut vm = Vm::new("x");
        vm.groups = vec![id(2), id(2)];
        let added = m.add_vm(vm).unwrap();

        assert_eq!(added.groups, vec![id(2)]);
        assert_eq!(m.get_group(id(2)).unwrap().members, vec![added.id]);
        assert_symmetric(&m);
    }

    #[test]
    fn test_add_vm_roundtrips_through_resolve() {
        let mut m = manager();
        let file = m.add_file(File::new("Debian Jessie.iso", FileType::Iso, 10)).unwrap();
        let mut vm = Vm::new("crater");
        vm.ram = 8;
        vm.ip = "10.0.0.1".into();
        vm.iso = Some(file.id);
        let added = m.add_vm(vm).unwrap();

        let resolved = m.resolve(added.id).unwrap();
        assert_eq!(resolved, AnyEntity::Vm(added));
    }

    #[test]
    fn test_add_vm_rejects_missing_file() {
        let mut m = manager();
        let next = m.next_id();
        let mut vm = Vm::new("x");
        vm.disk = Some(id(77));
        assert!(matches!(m.add_vm(vm), Err(ModelError::NotFound(_))));
        // failed adds do not consume ids
        assert_eq!(m.next_id(), next);
    }

    #[test]
    fn test_returned_copies_are_isolated() {
        let m = manager();
        let mut vms = m.get_vms(None);
        vms[0].name = "mutated".into();
        vms[0].groups.push(id(2));

        let mut resolved = m.resolve(id(1)).unwrap().into_vm().unwrap();
        resolved.ram = 999;

        let live = m.get_vm(id(1)).unwrap();
        assert_eq!(live.name, "v");
        assert_eq!(live.ram, 0);
        assert!(live.groups.is_empty());
    }

    #[test]
    fn test_rm_group_strips_memberships() {
        let mut m = manager();
        let mut vm = m.get_vm(id(1)).unwrap();
        vm.groups = vec![id(2)];
        m.set_vm(vm).unwrap();

        m.rm_group(id(2)).unwrap();
        assert!(m.resolve(id(1)).unwrap().into_vm().unwrap().groups.is_empty());
        assert!(matches!(m.resolve(id(2)), Err(ModelError::NotFound(_))));
        assert_symmetric(&m);
    }

    #[test]
    fn test_rm_group_strips_nested_membership() {
        let mut m = manager();
        let parent = m
            .add_group(Group::new("parent").with_members([id(2)]))
            .unwrap();
        m.rm_group(id(2)).unwrap();
        assert!(m.get_group(parent.id).unwrap().members.is_empty());
    }

    #[test]
    fn test_rm_vm_strips_memberships() {
        let mut m = manager();
        let added = m
            .add_group(Group::new("all").with_members([id(1)]))
            .unwrap();
        assert_eq!(m.get_vm(id(1)).unwrap().groups, vec![added.id]);

        m.rm_vm(id(1)).unwrap();
        assert!(m.get_group(added.id).unwrap().members.is_empty());
        assert!(m.get_group(id(2)).unwrap().members.is_empty());
        assert!(matches!(m.resolve(id(1)), Err(ModelError::NotFound(_))));
        assert_symmetric(&m);
    }

    #[test]
    fn test_rm_keeps_cache_positions_valid() {
        let mut m = manager();
        let a = m.add_vm(Vm::new("a")).unwrap();
        let b = m.add_vm(Vm::new("b")).unwrap();

        m.rm_vm(a.id).unwrap();
        assert_eq!(m.get_vm(b.id).unwrap().name, "b");
        assert_eq!(m.get_vm(id(1)).unwrap().name, "v");
    }

    #[test]
    fn test_rm_wrong_kind_or_unknown() {
        let mut m = manager();
        assert!(matches!(m.rm_vm(id(2)), Err(ModelError::WrongKind { .. })));
        assert!(matches!(m.rm_group(id(50)), Err(ModelError::NotFound(_))));
    }

    #[test]
    fn test_set_group_diffs_vm_members() {
        let mut m = manager();
        let other = m.add_vm(Vm::new("other")).unwrap();

        let mut group = m.get_group(id(2)).unwrap();
        group.members = vec![id(1), other.id];
        m.set_group(group.clone()).unwrap();
        assert_eq!(m.get_vm(other.id).unwrap().groups, vec![id(2)]);

        group.members = vec![other.id];
        m.set_group(group).unwrap();
        assert!(m.get_vm(id(1)).unwrap().groups.is_empty());
        assert_eq!(m.get_vm(other.id).unwrap().groups, vec![id(2)]);
        assert_symmetric(&m);
    }

    #[test]
    fn test_set_group_unchanged_members_is_noop() {
        let mut m = manager();
        let mut group = m.get_group(id(2)).unwrap();
        group.members = vec![id(1)];
        m.set_group(group.clone()).unwrap();

        group.name = "renamed".into();
        m.set_group(group).unwrap();
        assert_eq!(m.get_vm(id(1)).unwrap().groups, vec![id(2)]);
        assert_eq!(m.get_group(id(2)).unwrap().name, "renamed");
    }

    #[test]
    fn test_set_group_rejects_self_membership() {
        let mut m = manager();
        let mut group = m.get_group(id(2)).unwrap();
        group.members = vec![id(2)];
        assert!(matches!(m.set_group(group), Err(ModelError::Cycle { .. })));
    }

    #[test]
    fn test_set_group_rejects_indirect_cycle() {
        let mut m = manager();
        let outer = m
            .add_group(Group::new("outer").with_members([id(2)]))
            .unwrap();
        let top = m
            .add_group(Group::new("top").with_members([outer.id]))
            .unwrap();

        let mut inner = m.get_group(id(2)).unwrap();
        inner.members = vec![top.id];
        let before = m.export_state();
        assert!(matches!(
            m.set_group(inner),
            Err(ModelError::Cycle { member, .. }) if member == top.id
        ));
        assert_eq!(m.export_state(), before);
    }

    #[test]
    fn test_group_members_cannot_be_files() {
        let mut m = manager();
        let file = m.add_file(File::new("a.ova", FileType::Ova, 1)).unwrap();
        let err = m
            .add_group(Group::new("files").with_members([file.id]))
            .unwrap_err();
        assert!(matches!(err, ModelError::WrongKind { found: EntityKind::File, .. }));
    }

    #[test]
    fn test_groups_containing() {
        let mut m = manager();
        let parent = m
            .add_group(Group::new("parent").with_members([id(2), id(1)]))
            .unwrap();
        let parents = m.groups_containing(id(2));
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].id, parent.id);
    }

    #[test]
    fn test_queries_filter_by_pattern() {
        let mut m = manager();
        let mut vm = Vm::new("v");
        vm.cores = 4;
        m.add_vm(vm).unwrap();

        let same_name = m.get_vms(Some(&VmFilter {
            name: Some("v".into()),
            ..Default::default()
        }));
        assert_eq!(same_name.len(), 2);

        let four_cores = m.get_vms(Some(&VmFilter {
            name: Some("v".into()),
            cores: Some(4),
            ..Default::default()
        }));
        assert_eq!(four_cores.len(), 1);

        let groups = m.get_groups(Some(&GroupFilter {
            name: Some("G".into()),
            ..Default::default()
        }));
        assert_eq!(groups.len(), 1);
        assert!(m
            .get_files(Some(&FileFilter {
                file_type: Some(FileType::Disk),
                ..Default::default()
            }))
            .is_empty());
    }

    #[test]
    fn test_vms_using_file() {
        let mut m = manager();
        let disk = m.add_file(File::new("root.img", FileType::Disk, 1)).unwrap();
        let mut vm = m.get_vm(id(1)).unwrap();
        vm.disk = Some(disk.id);
        m.set_vm(vm).unwrap();
        assert_eq!(m.vms_using_file(disk.id).len(), 1);
    }

    #[test]
    fn test_init_rejects_inconsistent_state() {
        let mut m = manager();
        let mut bad = scenario_state();
        bad.vms[0].groups = vec![id(2)];

        assert!(matches!(m.init(Some(bad)), Err(ModelError::Inconsistent(_))));
        // previous state stays live
        assert_eq!(m.state().name, "t");
    }

    #[test]
    fn test_init_rejects_duplicate_ids() {
        let mut m = Manager::in_memory();
        let mut bad = scenario_state();
        bad.groups[0].id = id(1);
        assert!(matches!(m.init(Some(bad)), Err(ModelError::DuplicateId(_))));
    }

    #[test]
    fn test_init_without_state_generates_one() {
        let mut m = Manager::in_memory().with_generator_sizes(GeneratorSizes {
            vms: 5,
            groups: 2,
            files: 3,
        });
        m.init(None).unwrap();
        assert_eq!(m.state().vms.len(), 5);
        assert_eq!(m.state().groups.len(), 2);
        assert_eq!(m.state().files.len(), 3);
        assert_symmetric(&m);

        let added = m.add_vm(Vm::new("extra")).unwrap();
        assert_eq!(added.id, id(10));
    }

    #[test]
    fn test_ids_move_past_loaded_state() {
        let mut m = Manager::in_memory();
        let mut state = scenario_state();
        state.vms[0].id = id(100);
        m.init(Some(state)).unwrap();
        assert_eq!(m.add_vm(Vm::new("x")).unwrap().id, id(101));
    }

    #[test]
    fn test_reserve_ids_below() {
        let mut m = manager();
        m.reserve_ids_below(id(50));
        assert_eq!(m.next_id(), id(50));
        m.reserve_ids_below(id(10));
        assert_eq!(m.next_id(), id(50));
    }

    #[test]
    fn test_save_and_restore_by_token() {
        let mut m = manager();
        let mut vm = m.get_vm(id(1)).unwrap();
        vm.groups = vec![id(2)];
        m.set_vm(vm).unwrap();
        let saved = m.export_state();
        let token = m.save_state().unwrap();

        m.rm_group(id(2)).unwrap();
        m.add_vm(Vm::new("later")).unwrap();

        m.restore_state(Some(&token)).unwrap();
        assert_eq!(m.export_state(), saved);
        assert_eq!(m.get_group(id(2)).unwrap().members, vec![id(1)]);
        assert_symmetric(&m);
    }

    #[test]
    fn test_restore_without_token_pops_latest() {
        let mut m = manager();
        let first = m.save_state().unwrap();
        m.add_vm(Vm::new("second")).unwrap();
        let second = m.save_state().unwrap();
        m.add_vm(Vm::new("third")).unwrap();

        m.restore_state(None).unwrap();
        assert_eq!(m.get_vms(None).len(), 2);
        assert_eq!(m.snapshot_tokens().unwrap(), vec![first]);

        m.restore_state(None).unwrap();
        assert_eq!(m.get_vms(None).len(), 1);
        assert!(m.snapshot_tokens().unwrap().is_empty());

        assert!(matches!(m.restore_state(None), Err(ModelError::EmptyStack)));

        // explicit restore still works after the pop
        m.restore_state(Some(&second)).unwrap();
        assert_eq!(m.get_vms(None).len(), 2);
    }

    #[test]
    fn test_restore_unknown_token() {
        let mut m = manager();
        let err = m.restore_state(Some("nonexistent-token")).unwrap_err();
        assert!(matches!(err, ModelError::SnapshotNotFound(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_restore_keeps_ids_fresh() {
        let mut m = manager();
        let token = m.save_state().unwrap();
        let added = m.add_vm(Vm::new("after-save")).unwrap();

        m.restore_state(Some(&token)).unwrap();
        let again = m.add_vm(Vm::new("after-restore")).unwrap();
        assert!(again.id > added.id);
    }
}
