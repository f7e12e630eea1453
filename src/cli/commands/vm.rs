//! `vmanager vm` command - Virtual machine management

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{open_workspace, output_format, success, FileRef};
use crate::cli::table::{print_list, print_one};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityId;
use crate::core::links;
use crate::entities::{Vm, VmFilter, VmState};

#[derive(Subcommand, Debug)]
pub enum VmCommands {
    /// List VMs with filtering
    List(ListArgs),

    /// Show a VM's details
    Show(ShowArgs),

    /// Add a new VM
    Add(AddArgs),

    /// Change fields and group memberships of a VM
    Set(SetArgs),

    /// Remove a VM
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by name (exact match)
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Filter by run state
    #[arg(long, short = 's')]
    pub state: Option<VmState>,

    /// Only VMs that belong to this group
    #[arg(long, short = 'g')]
    pub group: Option<EntityId>,

    /// Filter by number of cores
    #[arg(long)]
    pub cores: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// VM ID
    pub id: EntityId,
}

/// Fields shared by `add` and `set`
#[derive(clap::Args, Debug, Default)]
pub struct VmFields {
    /// Memory in GB
    #[arg(long)]
    pub ram: Option<u32>,

    /// Disk capacity in GB
    #[arg(long)]
    pub hd: Option<u32>,

    /// CPU share in percent
    #[arg(long)]
    pub cpu: Option<u32>,

    /// Number of virtual cores
    #[arg(long)]
    pub cores: Option<u32>,

    /// IPv4 address
    #[arg(long)]
    pub ip: Option<String>,

    /// Upload bandwidth in Kbps
    #[arg(long)]
    pub up: Option<u32>,

    /// Download bandwidth in Kbps
    #[arg(long)]
    pub down: Option<u32>,

    /// ISO file ID, or "none"
    #[arg(long, allow_hyphen_values = true)]
    pub iso: Option<FileRef>,

    /// Disk file ID, or "none"
    #[arg(long, allow_hyphen_values = true)]
    pub disk: Option<FileRef>,

    /// Memory file ID, or "none"
    #[arg(long, allow_hyphen_values = true)]
    pub memory: Option<FileRef>,

    /// Run state
    #[arg(long)]
    pub state: Option<VmState>,
}

impl VmFields {
    /// Overwrite the fields that were given on the command line
    fn apply(&self, vm: &mut Vm) {
        if let Some(ram) = self.ram {
            vm.ram = ram;
        }
        if let Some(hd) = self.hd {
            vm.hd = hd;
        }
        if let Some(cpu) = self.cpu {
            vm.cpu = cpu;
        }
        if let Some(cores) = self.cores {
            vm.cores = cores;
        }
        if let Some(ref ip) = self.ip {
            vm.ip = ip.clone();
        }
        if let Some(up) = self.up {
            vm.up = up;
        }
        if let Some(down) = self.down {
            vm.down = down;
        }
        if let Some(FileRef(iso)) = self.iso {
            vm.iso = iso;
        }
        if let Some(FileRef(disk)) = self.disk {
            vm.disk = disk;
        }
        if let Some(FileRef(memory)) = self.memory {
            vm.memory = memory;
        }
        if let Some(state) = self.state {
            vm.state = state;
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// VM name
    #[arg(long, short = 'n')]
    pub name: String,

    #[command(flatten)]
    pub fields: VmFields,

    /// Group to join (repeatable)
    #[arg(long = "group", short = 'g')]
    pub groups: Vec<EntityId>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// VM ID
    pub id: EntityId,

    /// New name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    #[command(flatten)]
    pub fields: VmFields,

    /// Group to join (repeatable)
    #[arg(long)]
    pub join: Vec<EntityId>,

    /// Group to leave (repeatable)
    #[arg(long)]
    pub leave: Vec<EntityId>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// VM ID
    pub id: EntityId,
}

/// Run a vm subcommand
pub fn run(cmd: VmCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        VmCommands::List(args) => run_list(args, global),
        VmCommands::Show(args) => run_show(args, global),
        VmCommands::Add(args) => run_add(args, global),
        VmCommands::Set(args) => run_set(args, global),
        VmCommands::Rm(args) => run_rm(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = open_workspace(global)?;

    let filter = VmFilter {
        name: args.name,
        state: args.state,
        in_group: args.group,
        cores: args.cores,
        ..Default::default()
    };
    let vms = ws.manager().get_vms(Some(&filter));

    print_list(&vms, output_format(global, OutputFormat::Table), global.quiet)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ws = open_workspace(global)?;
    let vm = ws.manager().get_vm(args.id).into_diagnostic()?;
    print_one(&vm, output_format(global, OutputFormat::Auto))
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = open_workspace(global)?;

    let mut vm = Vm::new(args.name);
    args.fields.apply(&mut vm);
    vm.groups = args.groups;

    let added = ws.manager_mut().add_vm(vm).into_diagnostic()?;
    ws.save().into_diagnostic()?;

    if global.format == OutputFormat::Id {
        println!("{}", added.id);
    } else {
        success(global, format!("Added vm {} ({})", added.id, added.name));
    }
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = open_workspace(global)?;

    let mut vm = ws.manager().get_vm(args.id).into_diagnostic()?;
    if let Some(name) = args.name {
        vm.name = name;
    }
    args.fields.apply(&mut vm);
    for group in &args.leave {
        links::strip(&mut vm.groups, *group);
    }
    for group in &args.join {
        links::push_unique(&mut vm.groups, *group);
    }

    let updated = ws.manager_mut().set_vm(vm).into_diagnostic()?;
    ws.save().into_diagnostic()?;

    success(global, format!("Updated vm {} ({})", updated.id, updated.name));
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = open_workspace(global)?;
    ws.manager_mut().rm_vm(args.id).into_diagnostic()?;
    ws.save().into_diagnostic()?;

    success(global, format!("Removed vm {}", args.id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_only_touch_given_values() {
        let mut vm = Vm::new("eagle");
        vm.ram = 8;
        vm.iso = Some(EntityId::new(3));

        let fields = VmFields {
            cores: Some(2),
            iso: Some(FileRef(None)),
            ..Default::default()
        };
        fields.apply(&mut vm);

        assert_eq!(vm.ram, 8);
        assert_eq!(vm.cores, 2);
        assert_eq!(vm.iso, None);
    }
}
