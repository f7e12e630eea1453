//! vmanager: virtual machine inventory
//!
//! An in-memory model of VMs, groups and storage files with bidirectional
//! membership kept consistent on every change, plus save/restore snapshots
//! in a key-value store.

pub mod cli;
pub mod core;
pub mod entities;
