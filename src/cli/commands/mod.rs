//! CLI command implementations

pub mod check;
pub mod completions;
pub mod export;
pub mod file;
pub mod group;
pub mod init;
pub mod show;
pub mod snapshot;
pub mod vm;
