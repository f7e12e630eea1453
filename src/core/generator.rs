//! Random but internally consistent inventories
//!
//! Used by `init` when no state is supplied. Membership is written on both
//! sides as it is generated, so the result always passes an integrity check.

use std::collections::HashMap;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;

use crate::core::identity::IdAllocator;
use crate::core::state::State;
use crate::entities::{File, FileType, Group, Vm, VmState};

/// Name of every generated state
pub const GENERATED_NAME: &str = "Generated VMs";

/// Chance that a given VM joins a given group
const MEMBERSHIP_PROBABILITY: f64 = 0.2;

const MB: u64 = 1024 * 1024;

const LAKE_NAMES: &[&str] = &[
    "action", "enid", "marion", "sawtooth", "alturas", "erie", "meade", "seeley", "bantam",
    "fairfax", "merritt", "seminole", "baron", "fallriver", "michigan", "sevier", "beaver",
    "fenton", "minnetonka", "shasta", "beshear", "geneva", "mono", "sinclair", "bluestone",
    "george", "navajo", "spirit", "bluewater", "greenbo", "okeechobee", "storm", "burke",
    "greers", "ontario", "stump", "caddo", "greeson", "ozarks", "summer", "candlewood", "gull",
    "patoka", "sunapee", "cedar", "harding", "peck", "superior", "champlain", "harris", "perry",
    "sutton", "claytor", "hartwell", "placid", "tahoe", "como", "hauser", "pleasant", "texoma",
    "cowan", "heron", "pontchartrain", "travis", "crater", "higgins", "powell", "trinity",
    "crescent", "holt", "pyramid", "tule", "crystal", "horsehead", "redfish", "tupper",
    "cumberland", "houghton", "rend", "tygart", "cypress", "huron", "rico", "ute", "degray",
    "isabella", "rush", "verret", "delta", "kickapoo", "sabbatia", "walker", "donner",
    "kissimmee", "sabine", "walloon", "eagle", "leech", "sakakawea", "wheeler", "elk",
    "liberty", "salton", "wilson", "elwell", "locust", "sardis", "zoar", "emporia", "lurleen",
    "saugatuck",
];

const SIMPSONS_NAMES: &[&str] = &[
    "lisa", "bart", "maggie", "homer", "marge", "milhouse", "martin", "ralph", "burns",
    "smithers", "barney", "grampa", "flanders", "wiggum", "lovejoy", "willie", "apu", "bob",
    "skinner", "edna", "krusty", "nelson", "quimby", "brockman", "riviera", "otto", "patty",
    "selma", "frink",
];

const OS_NAMES: &[&str] = &[
    "Windows 2000",
    "Windows XP",
    "Windows Vista",
    "Windows 7",
    "Windows 8",
    "Windows 10",
    "Windows 11",
    "Debian Lenny",
    "Debian Squeeze",
    "Debian Wheezy",
    "Debian Jessie",
    "Debian Stretch",
    "Debian Buster",
    "Debian Bullseye",
    "Debian Bookworm",
    "MacOS X Jaguar",
    "MacOS X Leopard",
    "MacOS X Mountain Lion",
    "MacOS X Mavericks",
    "MacOS 11 Big Sur",
    "MacOS 13 Ventura",
    "MacOS 14 Sonoma",
];

/// How many entities of each kind to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorSizes {
    pub vms: usize,
    pub groups: usize,
    pub files: usize,
}

impl Default for GeneratorSizes {
    fn default() -> Self {
        Self {
            vms: 40,
            groups: 10,
            files: 20,
        }
    }
}

/// Generate a state using the thread-local RNG
pub fn populate(ids: &mut IdAllocator, sizes: GeneratorSizes) -> State {
    populate_with(&mut rand::rng(), ids, sizes)
}

/// Generate a state from `rng`
///
/// VM names come from lakes, group names from a cartoon cast, and ISO files
/// from operating system releases. Repeated names get a numeric suffix. At
/// most one ISO is generated per release name.
pub fn populate_with<R: Rng + ?Sized>(
    rng: &mut R,
    ids: &mut IdAllocator,
    sizes: GeneratorSizes,
) -> State {
    let mut vm_names = HashMap::new();
    let mut vms: Vec<Vm> = (0..sizes.vms)
        .map(|_| random_vm(rng, ids, &mut vm_names))
        .collect();

    let mut group_names = HashMap::new();
    let mut groups: Vec<Group> = (0..sizes.groups)
        .map(|_| {
            let mut group = Group::new(unique_name(rng, SIMPSONS_NAMES, &mut group_names));
            group.id = ids.allocate();
            group
        })
        .collect();

    for group in &mut groups {
        for vm in &mut vms {
            if rng.random_bool(MEMBERSHIP_PROBABILITY) {
                group.members.push(vm.id);
                vm.groups.push(group.id);
            }
        }
    }

    let files = OS_NAMES
        .choose_multiple(rng, sizes.files.min(OS_NAMES.len()))
        .map(|os| {
            let mut file = File::new(
                format!("{}.iso", os),
                FileType::Iso,
                rng.random_range(MB..=19 * MB),
            );
            file.id = ids.allocate();
            file
        })
        .collect();

    State {
        name: GENERATED_NAME.to_string(),
        vms,
        groups,
        files,
    }
}

fn random_vm<R: Rng + ?Sized>(
    rng: &mut R,
    ids: &mut IdAllocator,
    names: &mut HashMap<String, u32>,
) -> Vm {
    let mut vm = Vm::new(unique_name(rng, LAKE_NAMES, names));
    vm.id = ids.allocate();
    vm.ram = rng.random_range(1..=128);
    vm.hd = rng.random_range(1..=4 * 1024);
    vm.cpu = rng.random_range(5..=100);
    vm.cores = rng.random_range(1..=6);
    vm.ip = random_ip(rng);
    vm.up = rng.random_range(1..=1024);
    vm.down = rng.random_range(1..=1024);
    vm.state = *VmState::all().choose(rng).unwrap_or(&VmState::Stopped);
    vm
}

fn random_ip<R: Rng + ?Sized>(rng: &mut R) -> String {
    let octets: [u8; 4] = rng.random();
    octets
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Pick a name from `pool`, suffixing repeats with 1, 2, ...
fn unique_name<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[&str],
    seen: &mut HashMap<String, u32>,
) -> String {
    let base = pool.choose(rng).copied().unwrap_or("unnamed");
    match seen.get_mut(base) {
        None => {
            seen.insert(base.to_string(), 1);
            base.to_string()
        }
        Some(next) => {
            let name = format!("{}{}", base, next);
            *next += 1;
            name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::links::integrity_violations;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_populate_sizes() {
        let mut ids = IdAllocator::new();
        let state = populate(&mut ids, GeneratorSizes::default());

        assert_eq!(state.name, GENERATED_NAME);
        assert_eq!(state.vms.len(), 40);
        assert_eq!(state.groups.len(), 10);
        assert_eq!(state.files.len(), 20);
        assert_eq!(ids.peek().get(), 70);
    }

    #[test]
    fn test_file_count_is_capped_by_release_names() {
        let mut ids = IdAllocator::new();
        let sizes = GeneratorSizes {
            vms: 0,
            groups: 0,
            files: 500,
        };
        let state = populate(&mut ids, sizes);
        assert_eq!(state.files.len(), OS_NAMES.len());
        assert!(state.files.iter().all(|f| f.name.ends_with(".iso")));
    }

    #[test]
    fn test_generated_state_is_consistent() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut ids = IdAllocator::new();
        let state = populate_with(&mut rng, &mut ids, GeneratorSizes::default());

        assert!(integrity_violations(&state).is_empty());

        let unique: HashSet<_> = state.ids().collect();
        assert_eq!(unique.len(), state.len());
    }

    #[test]
    fn test_generated_names_are_unique() {
        let mut ids = IdAllocator::new();
        let sizes = GeneratorSizes {
            vms: 300,
            groups: 60,
            files: 0,
        };
        let state = populate(&mut ids, sizes);

        let names: HashSet<_> = state.vms.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names.len(), 300);
        let names: HashSet<_> = state.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names.len(), 60);
    }

    #[test]
    fn test_generated_vm_ranges() {
        let mut ids = IdAllocator::new();
        let state = populate(&mut ids, GeneratorSizes::default());
        for vm in &state.vms {
            assert!((1..=128).contains(&vm.ram));
            assert!((5..=100).contains(&vm.cpu));
            assert!((1..=6).contains(&vm.cores));
            assert_eq!(vm.ip.split('.').count(), 4);
            assert!(vm.iso.is_none());
        }
    }
}
