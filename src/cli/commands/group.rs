//! `vmanager group` command - Group management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{format_ids, open_workspace, output_format, success};
use crate::cli::table::{print_list, print_one};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityId;
use crate::core::links;
use crate::entities::{Group, GroupFilter};

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// List groups with filtering
    List(ListArgs),

    /// Show a group's details
    Show(ShowArgs),

    /// Add a new group
    Add(AddArgs),

    /// Rename a group or change its members
    Set(SetArgs),

    /// Remove a group
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by name (exact match)
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Only groups that contain this VM or group
    #[arg(long, short = 'c')]
    pub contains: Option<EntityId>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Group ID
    pub id: EntityId,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Group name
    #[arg(long, short = 'n')]
    pub name: String,

    /// VM or group to include (repeatable)
    #[arg(long = "member", short = 'm')]
    pub members: Vec<EntityId>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Group ID
    pub id: EntityId,

    /// New name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Member to add (repeatable)
    #[arg(long)]
    pub add: Vec<EntityId>,

    /// Member to remove (repeatable)
    #[arg(long)]
    pub remove: Vec<EntityId>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Group ID
    pub id: EntityId,
}

/// Run a group subcommand
pub fn run(cmd: GroupCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        GroupCommands::List(args) => run_list(args, global),
        GroupCommands::Show(args) => run_show(args, global),
        GroupCommands::Add(args) => run_add(args, global),
        GroupCommands::Set(args) => run_set(args, global),
        GroupCommands::Rm(args) => run_rm(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = open_workspace(global)?;

    let filter = GroupFilter {
        name: args.name,
        contains: args.contains,
        ..Default::default()
    };
    let groups = ws.manager().get_groups(Some(&filter));

    print_list(&groups, output_format(global, OutputFormat::Table), global.quiet)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ws = open_workspace(global)?;
    let group = ws.manager().get_group(args.id).into_diagnostic()?;

    let format = output_format(global, OutputFormat::Auto);
    print_one(&group, format)?;

    if format == OutputFormat::Auto {
        let parents: Vec<EntityId> = ws
            .manager()
            .groups_containing(group.id)
            .iter()
            .map(|g| g.id)
            .collect();
        if !parents.is_empty() {
            println!("{}: {}", style("Contained in").bold(), format_ids(&parents));
        }
    }
    Ok(())
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = open_workspace(global)?;

    let group = Group::new(args.name).with_members(args.members);
    let added = ws.manager_mut().add_group(group).into_diagnostic()?;
    ws.save().into_diagnostic()?;

    if global.format == OutputFormat::Id {
        println!("{}", added.id);
    } else {
        success(
            global,
            format!(
                "Added group {} ({}) with {} member(s)",
                added.id,
                added.name,
                added.members.len()
            ),
        );
    }
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = open_workspace(global)?;

    let mut group = ws.manager().get_group(args.id).into_diagnostic()?;
    if let Some(name) = args.name {
        group.name = name;
    }
    for member in &args.remove {
        links::strip(&mut group.members, *member);
    }
    for member in &args.add {
        links::push_unique(&mut group.members, *member);
    }

    let updated = ws.manager_mut().set_group(group).into_diagnostic()?;
    ws.save().into_diagnostic()?;

    success(
        global,
        format!(
            "Updated group {} ({}), now {} member(s)",
            updated.id,
            updated.name,
            updated.members.len()
        ),
    );
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = open_workspace(global)?;
    ws.manager_mut().rm_group(args.id).into_diagnostic()?;
    ws.save().into_diagnostic()?;

    success(global, format!("Removed group {}", args.id));
    Ok(())
}
