//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    export::ExportArgs,
    file::FileCommands,
    group::GroupCommands,
    init::InitArgs,
    show::ShowArgs,
    snapshot::RestoreArgs,
    vm::VmCommands,
};

#[derive(Parser)]
#[command(name = "vmanager")]
#[command(author, version, about = "Virtual machine inventory manager")]
#[command(long_about = "Keeps an inventory of virtual machines, the groups they belong to and the files they use, with save/restore snapshots.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Store file (default: from config, $VMANAGER_STORE, or the user data dir)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the working state, from a file or randomly generated
    Init(InitArgs),

    /// Virtual machine management
    #[command(subcommand)]
    Vm(VmCommands),

    /// Group management
    #[command(subcommand)]
    Group(GroupCommands),

    /// File management (ISO images, disks, memory dumps)
    #[command(subcommand)]
    File(FileCommands),

    /// Show any entity by ID
    Show(ShowArgs),

    /// Save the working state as a snapshot
    Save,

    /// Restore a snapshot (default: pop the most recent one)
    Restore(RestoreArgs),

    /// List saved snapshot tokens, oldest first
    Snapshots,

    /// Check the working state for broken references
    Check,

    /// Write the working state as JSON
    Export(ExportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for lists, a field listing for single entities
    #[default]
    Auto,
    /// Aligned table
    Table,
    /// JSON format (for programming)
    Json,
    /// YAML format
    Yaml,
    /// CSV format (for spreadsheets)
    Csv,
    /// Just IDs, one per line
    Id,
}
