//! `vmanager check` command - Integrity report
//!
//! Reads the stored state without loading it into the model, so a store
//! that the model refuses to open can still be diagnosed.

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{store_path, success};
use crate::cli::GlobalOpts;
use crate::core::links::integrity_violations;
use crate::core::{Config, Workspace};

pub fn run(global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let path = store_path(global, &config);
    let state = Workspace::load_raw(&path).into_diagnostic()?;

    let problems = integrity_violations(&state);
    if problems.is_empty() {
        success(
            global,
            format!(
                "'{}' is consistent ({} vms, {} groups, {} files)",
                state.name,
                state.vms.len(),
                state.groups.len(),
                state.files.len()
            ),
        );
        return Ok(());
    }

    for problem in &problems {
        eprintln!("{} {}", style("✗").red(), problem);
    }
    Err(miette::miette!(
        "{} integrity violation(s) in {}",
        problems.len(),
        path.display()
    ))
}
