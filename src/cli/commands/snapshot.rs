//! `vmanager save`, `restore` and `snapshots` commands

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{open_workspace, output_format, success};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct RestoreArgs {
    /// Snapshot token (default: pop the most recently saved one)
    pub token: Option<String>,
}

pub fn run_save(global: &GlobalOpts) -> Result<()> {
    let mut ws = open_workspace(global)?;
    let token = ws.manager_mut().save_state().into_diagnostic()?;

    if global.quiet || global.format == OutputFormat::Id {
        println!("{}", token);
    } else {
        success(global, format!("Saved snapshot {}", style(&token).cyan()));
    }
    Ok(())
}

pub fn run_restore(args: RestoreArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = open_workspace(global)?;
    ws.manager_mut()
        .restore_state(args.token.as_deref())
        .into_diagnostic()?;
    ws.save().into_diagnostic()?;

    let state = ws.manager().state();
    success(
        global,
        format!(
            "Restored '{}' ({} vms, {} groups, {} files)",
            state.name,
            state.vms.len(),
            state.groups.len(),
            state.files.len()
        ),
    );
    Ok(())
}

pub fn run_list(global: &GlobalOpts) -> Result<()> {
    let ws = open_workspace(global)?;
    let tokens = ws.manager().snapshot_tokens().into_diagnostic()?;

    match output_format(global, OutputFormat::Id) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&tokens).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&tokens).into_diagnostic()?);
        }
        _ => {
            if tokens.is_empty() && !global.quiet {
                println!("No snapshots saved.");
            }
            for token in &tokens {
                println!("{}", token);
            }
        }
    }
    Ok(())
}
