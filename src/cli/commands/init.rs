//! `vmanager init` command - Create the working state

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::store_path;
use crate::cli::GlobalOpts;
use crate::core::state::State;
use crate::core::workspace::{Workspace, WorkspaceError};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Load the state from a JSON file instead of generating one
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Name of the new state
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Number of VMs to generate
    #[arg(long, conflicts_with = "file")]
    pub vms: Option<usize>,

    /// Number of groups to generate
    #[arg(long, conflicts_with = "file")]
    pub groups: Option<usize>,

    /// Number of ISO files to generate
    #[arg(long, conflicts_with = "file")]
    pub files: Option<usize>,

    /// Replace an existing working state (snapshots are kept)
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let path = store_path(global, &config);

    let mut sizes = config.generator_sizes();
    if let Some(vms) = args.vms {
        sizes.vms = vms;
    }
    if let Some(groups) = args.groups {
        sizes.groups = groups;
    }
    if let Some(files) = args.files {
        sizes.files = files;
    }

    let state = match args.file {
        Some(ref file) => {
            let contents = std::fs::read_to_string(file).into_diagnostic()?;
            let state = State::from_json(&contents).map_err(|e| {
                miette::miette!("failed to parse {}: {}", file.display(), e)
            })?;
            Some(state)
        }
        None => None,
    };

    let mut ws = match Workspace::create(&path, state, sizes, args.force) {
        Ok(ws) => ws,
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} A working state already exists in {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to replace it",
                style("vmanager init --force").yellow()
            );
            return Ok(());
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    if let Some(name) = args.name {
        ws.manager_mut().set_name(name);
        ws.save().into_diagnostic()?;
    }

    if global.quiet {
        return Ok(());
    }

    let state = ws.manager().state();
    println!(
        "{} Initialized '{}' in {}",
        style("✓").green(),
        style(&state.name).yellow(),
        style(ws.path().display()).cyan()
    );
    println!(
        "  {} vms, {} groups, {} files",
        style(state.vms.len()).cyan(),
        style(state.groups.len()).cyan(),
        style(state.files.len()).cyan()
    );
    println!();
    println!("Next steps:");
    println!("  {} List virtual machines", style("vmanager vm list").yellow());
    println!("  {} Save a snapshot", style("vmanager save").yellow());
    Ok(())
}
