//! Entity type definitions
//!
//! vmanager tracks three kinds of entity, all sharing one id space:
//!
//! - [`Vm`] - A virtual machine with resources, run state and group memberships
//! - [`Group`] - A named collection of VMs and nested groups
//! - [`File`] - An immutable storage file (ISO, OVA, memory dump, disk image)

pub mod file;
pub mod group;
pub mod vm;

pub use file::{File, FileFilter, FileType};
pub use group::{Group, GroupFilter};
pub use vm::{Vm, VmFilter, VmState};
