//! `vmanager export` command - Dump the working state
//!
//! The JSON written here is accepted by `vmanager init --file`.

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{open_workspace, success};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let ws = open_workspace(global)?;
    let state = ws.manager().state();

    let text = match global.format {
        OutputFormat::Yaml => serde_yml::to_string(state).into_diagnostic()?,
        _ => {
            let mut json = serde_json::to_string_pretty(state).into_diagnostic()?;
            json.push('\n');
            json
        }
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, text).into_diagnostic()?;
            success(global, format!("Exported '{}' to {}", state.name, path.display()));
        }
        None => print!("{}", text),
    }
    Ok(())
}
