//! `vmanager show` command - Resolve any ID

use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{open_workspace, output_format};
use crate::cli::table::print_one;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::AnyEntity;
use crate::core::identity::EntityId;

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// VM, group or file ID
    pub id: EntityId,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ws = open_workspace(global)?;
    let entity = ws.manager().resolve(args.id).into_diagnostic()?;

    // JSON and YAML carry the "kind" tag
    match output_format(global, OutputFormat::Auto) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&entity).into_diagnostic()?;
            println!("{}", json);
            Ok(())
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&entity).into_diagnostic()?;
            print!("{}", yaml);
            Ok(())
        }
        format => match entity {
            AnyEntity::Vm(vm) => print_one(&vm, format),
            AnyEntity::Group(group) => print_one(&group, format),
            AnyEntity::File(file) => print_one(&file, format),
        },
    }
}
