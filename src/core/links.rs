//! Membership bookkeeping between VMs and groups
//!
//! A VM's `groups` and a group's `members` are two views of the same
//! relation and must always agree. Nested groups are recorded only in the
//! parent's `members`; the "groups containing this group" view is derived.
//! This module holds the set arithmetic used to keep both sides in sync, the
//! cycle check for nested groups, and a full integrity scan of a [`State`].

use std::collections::{HashMap, HashSet};

use crate::core::entity::EntityKind;
use crate::core::identity::EntityId;
use crate::core::state::State;
use crate::entities::Group;

/// Ids in `a` that are not in `b`, in `a`'s order
pub fn difference(a: &[EntityId], b: &[EntityId]) -> Vec<EntityId> {
    let exclude: HashSet<EntityId> = b.iter().copied().collect();
    a.iter().copied().filter(|id| !exclude.contains(id)).collect()
}

/// True if both lists hold the same ids, ignoring order and repeats
pub fn same_set(a: &[EntityId], b: &[EntityId]) -> bool {
    let a: HashSet<EntityId> = a.iter().copied().collect();
    let b: HashSet<EntityId> = b.iter().copied().collect();
    a == b
}

/// Drop repeated ids, keeping the first occurrence of each
pub fn dedup(ids: &mut Vec<EntityId>) {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.retain(|id| seen.insert(*id));
}

/// Remove every occurrence of `id`, returning how many were removed
pub fn strip(ids: &mut Vec<EntityId>, id: EntityId) -> usize {
    let before = ids.len();
    ids.retain(|other| *other != id);
    before - ids.len()
}

/// Append `id` unless it is already present
pub fn push_unique(ids: &mut Vec<EntityId>, id: EntityId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

/// The change between an old and a new relationship list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    /// In the old list only
    pub dropped: Vec<EntityId>,
    /// In the new list only
    pub joined: Vec<EntityId>,
}

impl MembershipDiff {
    pub fn between(old: &[EntityId], new: &[EntityId]) -> Self {
        Self {
            dropped: difference(old, new),
            joined: difference(new, old),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dropped.is_empty() && self.joined.is_empty()
    }
}

/// True if `needle` is reachable from group `root` by following members
///
/// `root` itself counts, so `contains_transitively(groups, g, g)` is true.
pub fn contains_transitively(groups: &[Group], root: EntityId, needle: EntityId) -> bool {
    let by_id: HashMap<EntityId, &Group> = groups.iter().map(|g| (g.id, g)).collect();
    let mut visited = HashSet::new();
    let mut stack = vec![root];

    while let Some(current) = stack.pop() {
        if current == needle {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(group) = by_id.get(&current) {
            stack.extend(group.members.iter().copied());
        }
    }
    false
}

/// First member of `group` whose addition would close a cycle
///
/// `groups` is the current group collection. A member closes a cycle when it
/// is the group itself or a group that already (transitively) contains it.
pub fn find_cycle(groups: &[Group], group: EntityId, members: &[EntityId]) -> Option<EntityId> {
    members
        .iter()
        .copied()
        .find(|member| contains_transitively(groups, *member, group))
}

/// Scan a whole state for broken references
///
/// Returns one human-readable line per violation; an empty list means the
/// state is consistent.
pub fn integrity_violations(state: &State) -> Vec<String> {
    let mut kinds: HashMap<EntityId, EntityKind> = HashMap::new();
    let mut problems = Vec::new();

    for id in state.vms.iter().map(|v| v.id) {
        if kinds.insert(id, EntityKind::Vm).is_some() {
            problems.push(format!("duplicate ID {}", id));
        }
    }
    for id in state.groups.iter().map(|g| g.id) {
        if kinds.insert(id, EntityKind::Group).is_some() {
            problems.push(format!("duplicate ID {}", id));
        }
    }
    for id in state.files.iter().map(|f| f.id) {
        if kinds.insert(id, EntityKind::File).is_some() {
            problems.push(format!("duplicate ID {}", id));
        }
    }

    let members_of: HashMap<EntityId, &Vec<EntityId>> =
        state.groups.iter().map(|g| (g.id, &g.members)).collect();

    for vm in &state.vms {
        for (field, file) in [("iso", vm.iso), ("disk", vm.disk), ("memory", vm.memory)] {
            let Some(file) = file else { continue };
            match kinds.get(&file) {
                None => problems.push(format!("vm {} {}: file {} does not exist", vm.id, field, file)),
                Some(EntityKind::File) => {}
                Some(kind) => problems.push(format!(
                    "vm {} {}: {} is a {}, not a file",
                    vm.id, field, file, kind
                )),
            }
        }

        let mut seen = HashSet::new();
        for group in &vm.groups {
            if !seen.insert(*group) {
                problems.push(format!("vm {} lists group {} twice", vm.id, group));
                continue;
            }
            match members_of.get(group) {
                None => match kinds.get(group) {
                    None => problems.push(format!("vm {}: group {} does not exist", vm.id, group)),
                    Some(kind) => problems.push(format!(
                        "vm {}: {} is a {}, not a group",
                        vm.id, group, kind
                    )),
                },
                Some(members) if !members.contains(&vm.id) => problems.push(format!(
                    "vm {} lists group {}, but the group does not list the vm",
                    vm.id, group
                )),
                Some(_) => {}
            }
        }
    }

    let groups_of: HashMap<EntityId, &Vec<EntityId>> =
        state.vms.iter().map(|v| (v.id, &v.groups)).collect();

    for group in &state.groups {
        let mut seen = HashSet::new();
        for member in &group.members {
            if !seen.insert(*member) {
                problems.push(format!("group {} lists member {} twice", group.id, member));
                continue;
            }
            match kinds.get(member) {
                None => problems.push(format!(
                    "group {}: member {} does not exist",
                    group.id, member
                )),
                Some(EntityKind::File) => problems.push(format!(
                    "group {}: member {} is a file",
                    group.id, member
                )),
                Some(EntityKind::Vm) => {
                    let listed = groups_of
                        .get(member)
                        .is_some_and(|groups| groups.contains(&group.id));
                    if !listed {
                        problems.push(format!(
                            "group {} lists vm {}, but the vm does not list the group",
                            group.id, member
                        ));
                    }
                }
                Some(EntityKind::Group) => {
                    if contains_transitively(&state.groups, *member, group.id) {
                        problems.push(format!(
                            "group {} is part of a membership cycle through {}",
                            group.id, member
                        ));
                    }
                }
            }
        }
    }

    problems
}
