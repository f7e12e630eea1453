//! Virtual machine entity type

use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, EntityKind};
use crate::core::identity::{none_sentinel, EntityId};

/// Run state of a virtual machine
///
/// Parsing ignores case and also takes the legacy stored spellings
/// (`funcionando`, `apagada`, `suspendida`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[derive(Default)]
pub enum VmState {
    Running,
    #[default]
    Stopped,
    Suspended,
}

impl VmState {
    pub fn all() -> &'static [VmState] {
        &[VmState::Running, VmState::Stopped, VmState::Suspended]
    }
}

impl std::fmt::Display for VmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VmState::Running => write!(f, "running"),
            VmState::Stopped => write!(f, "stopped"),
            VmState::Suspended => write!(f, "suspended"),
        }
    }
}

impl std::str::FromStr for VmState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" | "funcionando" => Ok(VmState::Running),
            "stopped" | "apagada" => Ok(VmState::Stopped),
            "suspended" | "suspendida" => Ok(VmState::Suspended),
            _ => Err(format!("Unknown VM state: {}", s)),
        }
    }
}

impl TryFrom<String> for VmState {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A virtual machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vm {
    /// Unique identifier
    pub id: EntityId,

    /// Display name
    pub name: String,

    /// Memory in GB
    #[serde(default)]
    pub ram: u32,

    /// Disk capacity in GB
    #[serde(default)]
    pub hd: u32,

    /// CPU share, as a percentage
    #[serde(default)]
    pub cpu: u32,

    /// Virtual cores
    #[serde(default)]
    pub cores: u32,

    /// IPv4 address as a dotted-quad string
    #[serde(default)]
    pub ip: String,

    /// Upload bandwidth in Kbps
    #[serde(default)]
    pub up: u32,

    /// Download bandwidth in Kbps
    #[serde(default)]
    pub down: u32,

    /// ISO file in the virtual drive
    #[serde(default, with = "none_sentinel")]
    pub iso: Option<EntityId>,

    /// Current run state
    #[serde(default)]
    pub state: VmState,

    /// File holding the disk contents
    #[serde(default, with = "none_sentinel")]
    pub disk: Option<EntityId>,

    /// File holding a memory dump (suspended VMs)
    #[serde(default, with = "none_sentinel")]
    pub memory: Option<EntityId>,

    /// Groups this VM belongs to
    #[serde(default)]
    pub groups: Vec<EntityId>,
}

impl Entity for Vm {
    const KIND: EntityKind = EntityKind::Vm;

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

impl Vm {
    /// Create a stopped VM with no resources and no group memberships
    ///
    /// The id is a placeholder; adding the VM to a model assigns a real one.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::default(),
            name: name.into(),
            ram: 0,
            hd: 0,
            cpu: 0,
            cores: 0,
            ip: String::new(),
            up: 0,
            down: 0,
            iso: None,
            state: VmState::default(),
            disk: None,
            memory: None,
            groups: Vec::new(),
        }
    }

    /// Every file this VM references
    pub fn file_refs(&self) -> impl Iterator<Item = EntityId> + '_ {
        [self.iso, self.disk, self.memory].into_iter().flatten()
    }
}

/// Partial-match filter for VMs
///
/// Every field that is set must equal the VM's field for the VM to match.
/// `groups` compares as a set; `in_group` only requires membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmFilter {
    pub id: Option<EntityId>,
    pub name: Option<String>,
    pub ram: Option<u32>,
    pub hd: Option<u32>,
    pub cpu: Option<u32>,
    pub cores: Option<u32>,
    pub ip: Option<String>,
    pub up: Option<u32>,
    pub down: Option<u32>,
    pub iso: Option<Option<EntityId>>,
    pub state: Option<VmState>,
    pub disk: Option<Option<EntityId>>,
    pub memory: Option<Option<EntityId>>,
    pub groups: Option<Vec<EntityId>>,
    pub in_group: Option<EntityId>,
}

impl VmFilter {
    pub fn matches(&self, vm: &Vm) -> bool {
        fn eq<T: PartialEq>(want: &Option<T>, have: &T) -> bool {
            want.as_ref().map_or(true, |w| w == have)
        }

        eq(&self.id, &vm.id)
            && eq(&self.name, &vm.name)
            && eq(&self.ram, &vm.ram)
            && eq(&self.hd, &vm.hd)
            && eq(&self.cpu, &vm.cpu)
            && eq(&self.cores, &vm.cores)
            && eq(&self.ip, &vm.ip)
            && eq(&self.up, &vm.up)
            && eq(&self.down, &vm.down)
            && eq(&self.iso, &vm.iso)
            && eq(&self.state, &vm.state)
            && eq(&self.disk, &vm.disk)
            && eq(&self.memory, &vm.memory)
            && self
                .groups
                .as_ref()
                .map_or(true, |g| crate::core::links::same_set(g, &vm.groups))
            && self.in_group.map_or(true, |g| vm.groups.contains(&g))
    }
}
