//! `vmanager file` command - File management
//!
//! Files are immutable: they can be added and inspected, never edited.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{format_ids, open_workspace, output_format, success};
use crate::cli::table::{print_list, print_one};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityId;
use crate::entities::{File, FileFilter, FileType};

#[derive(Subcommand, Debug)]
pub enum FileCommands {
    /// List files with filtering
    List(ListArgs),

    /// Show a file's details
    Show(ShowArgs),

    /// Register a new file
    Add(AddArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by name (exact match)
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Filter by file type
    #[arg(long, short = 't')]
    pub r#type: Option<FileType>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// File ID
    pub id: EntityId,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// File name
    #[arg(long, short = 'n')]
    pub name: String,

    /// File type
    #[arg(long, short = 't')]
    pub r#type: FileType,

    /// Size in bytes
    #[arg(long, short = 's', default_value_t = 0)]
    pub size: u64,
}

/// Run a file subcommand
pub fn run(cmd: FileCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        FileCommands::List(args) => run_list(args, global),
        FileCommands::Show(args) => run_show(args, global),
        FileCommands::Add(args) => run_add(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = open_workspace(global)?;

    let filter = FileFilter {
        name: args.name,
        file_type: args.r#type,
        ..Default::default()
    };
    let files = ws.manager().get_files(Some(&filter));

    print_list(&files, output_format(global, OutputFormat::Table), global.quiet)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ws = open_workspace(global)?;
    let file = ws.manager().get_file(args.id).into_diagnostic()?;

    let format = output_format(global, OutputFormat::Auto);
    print_one(&file, format)?;

    if format == OutputFormat::Auto {
        let users: Vec<EntityId> = ws
            .manager()
            .vms_using_file(file.id)
            .iter()
            .map(|vm| vm.id)
            .collect();
        if !users.is_empty() {
            println!("{}: {}", style("Used by").bold(), format_ids(&users));
        }
    }
    Ok(())
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = open_workspace(global)?;

    let file = File::new(args.name, args.r#type, args.size);
    let added = ws.manager_mut().add_file(file).into_diagnostic()?;
    ws.save().into_diagnostic()?;

    if global.format == OutputFormat::Id {
        println!("{}", added.id);
    } else {
        success(
            global,
            format!("Added {} file {} ({})", added.file_type, added.id, added.name),
        );
    }
    Ok(())
}
