//! Table formatting utilities for CLI list and show commands
//!
//! Every entity type describes its columns once through [`Tabular`]; the
//! same description drives tables, CSV, ID lists and the field listing of
//! `show`. JSON and YAML go straight through serde.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_file_ref, format_ids, truncate_str};
use crate::cli::OutputFormat;
use crate::core::identity::EntityId;
use crate::entities::{File, FileType, Group, Vm, VmState};

/// Width at which table text columns are truncated
const TEXT_WIDTH: usize = 32;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Entity ID
    Id(EntityId),
    /// Plain text, truncated in tables
    Text(String),
    /// Unsigned quantity
    Number(u64),
    /// VM run state
    State(VmState),
    /// File type
    FileType(FileType),
    /// Optional file reference
    FileRef(Option<EntityId>),
    /// List of ids (memberships)
    Ids(Vec<EntityId>),
}

impl CellValue {
    /// Plain value, as written to CSV
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(id) => id.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::State(s) => s.to_string(),
            CellValue::FileType(t) => t.to_string(),
            CellValue::FileRef(r) => r.map(|id| id.to_string()).unwrap_or_default(),
            CellValue::Ids(ids) => ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Value for table cells
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => truncate_str(s, TEXT_WIDTH),
            CellValue::FileRef(r) => format_file_ref(*r),
            CellValue::Ids(ids) => format_ids(ids),
            other => other.raw(),
        }
    }

    /// Value for the `show` field listing, with color
    pub fn styled(&self) -> String {
        match self {
            CellValue::Id(id) => style(id).cyan().to_string(),
            CellValue::Text(s) => style(s).yellow().to_string(),
            CellValue::State(state) => {
                let s = state.to_string();
                match state {
                    VmState::Running => style(s).green().to_string(),
                    VmState::Stopped => style(s).dim().to_string(),
                    VmState::Suspended => style(s).yellow().to_string(),
                }
            }
            CellValue::FileRef(None) => style("-").dim().to_string(),
            CellValue::Ids(ids) if ids.is_empty() => style("-").dim().to_string(),
            other => other.display(),
        }
    }
}

/// Column definition: key plus header label
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str) -> Self {
        Self { key, header }
    }
}

/// One row of cells keyed by column
#[derive(Debug, Clone)]
pub struct TableRow {
    pub id: EntityId,
    cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// An entity that can be printed as a row
pub trait Tabular: Serialize {
    /// Singular name for summaries ("vm", "group", ...)
    const SINGULAR: &'static str;

    /// Columns shown by `list`, in order
    const COLUMNS: &'static [ColumnDef];

    /// Every field, for `show`
    const FIELDS: &'static [ColumnDef];

    fn to_row(&self) -> TableRow;
}

impl Tabular for Vm {
    const SINGULAR: &'static str = "vm";

    const COLUMNS: &'static [ColumnDef] = &[
        ColumnDef::new("id", "ID"),
        ColumnDef::new("name", "NAME"),
        ColumnDef::new("state", "STATE"),
        ColumnDef::new("ram", "RAM"),
        ColumnDef::new("cores", "CORES"),
        ColumnDef::new("ip", "IP"),
        ColumnDef::new("groups", "GROUPS"),
    ];

    const FIELDS: &'static [ColumnDef] = &[
        ColumnDef::new("id", "ID"),
        ColumnDef::new("name", "Name"),
        ColumnDef::new("state", "State"),
        ColumnDef::new("ram", "RAM (GB)"),
        ColumnDef::new("hd", "Disk (GB)"),
        ColumnDef::new("cpu", "CPU (%)"),
        ColumnDef::new("cores", "Cores"),
        ColumnDef::new("ip", "IP"),
        ColumnDef::new("up", "Up (Kbps)"),
        ColumnDef::new("down", "Down (Kbps)"),
        ColumnDef::new("iso", "ISO"),
        ColumnDef::new("disk", "Disk file"),
        ColumnDef::new("memory", "Memory file"),
        ColumnDef::new("groups", "Groups"),
    ];

    fn to_row(&self) -> TableRow {
        TableRow::new(self.id)
            .cell("id", CellValue::Id(self.id))
            .cell("name", CellValue::Text(self.name.clone()))
            .cell("state", CellValue::State(self.state))
            .cell("ram", CellValue::Number(self.ram.into()))
            .cell("hd", CellValue::Number(self.hd.into()))
            .cell("cpu", CellValue::Number(self.cpu.into()))
            .cell("cores", CellValue::Number(self.cores.into()))
            .cell("ip", CellValue::Text(self.ip.clone()))
            .cell("up", CellValue::Number(self.up.into()))
            .cell("down", CellValue::Number(self.down.into()))
            .cell("iso", CellValue::FileRef(self.iso))
            .cell("disk", CellValue::FileRef(self.disk))
            .cell("memory", CellValue::FileRef(self.memory))
            .cell("groups", CellValue::Ids(self.groups.clone()))
    }
}

impl Tabular for Group {
    const SINGULAR: &'static str = "group";

    const COLUMNS: &'static [ColumnDef] = &[
        ColumnDef::new("id", "ID"),
        ColumnDef::new("name", "NAME"),
        ColumnDef::new("count", "COUNT"),
        ColumnDef::new("members", "MEMBERS"),
    ];

    const FIELDS: &'static [ColumnDef] = &[
        ColumnDef::new("id", "ID"),
        ColumnDef::new("name", "Name"),
        ColumnDef::new("members", "Members"),
    ];

    fn to_row(&self) -> TableRow {
        TableRow::new(self.id)
            .cell("id", CellValue::Id(self.id))
            .cell("name", CellValue::Text(self.name.clone()))
            .cell("count", CellValue::Number(self.members.len() as u64))
            .cell("members", CellValue::Ids(self.members.clone()))
    }
}

impl Tabular for File {
    const SINGULAR: &'static str = "file";

    const COLUMNS: &'static [ColumnDef] = &[
        ColumnDef::new("id", "ID"),
        ColumnDef::new("name", "NAME"),
        ColumnDef::new("type", "TYPE"),
        ColumnDef::new("size", "SIZE"),
    ];

    const FIELDS: &'static [ColumnDef] = &[
        ColumnDef::new("id", "ID"),
        ColumnDef::new("name", "Name"),
        ColumnDef::new("type", "Type"),
        ColumnDef::new("size", "Size (bytes)"),
    ];

    fn to_row(&self) -> TableRow {
        TableRow::new(self.id)
            .cell("id", CellValue::Id(self.id))
            .cell("name", CellValue::Text(self.name.clone()))
            .cell("type", CellValue::FileType(self.file_type))
            .cell("size", CellValue::Number(self.size))
    }
}

/// Print a list of entities in `format` (`Auto` means table)
pub fn print_list<T: Tabular>(items: &[T], format: OutputFormat, quiet: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(items).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            let rows: Vec<TableRow> = items.iter().map(Tabular::to_row).collect();
            write_csv(&rows, T::COLUMNS)?;
        }
        OutputFormat::Id => {
            for item in items {
                println!("{}", item.to_row().id);
            }
        }
        OutputFormat::Auto | OutputFormat::Table => {
            if items.is_empty() {
                if !quiet {
                    println!("No {}s found.", T::SINGULAR);
                }
                return Ok(());
            }
            let rows: Vec<TableRow> = items.iter().map(Tabular::to_row).collect();
            println!("{}", render_table(&rows, T::COLUMNS));
            if !quiet {
                println!();
                println!("{} {}(s) found", style(items.len()).cyan(), T::SINGULAR);
            }
        }
    }
    Ok(())
}

/// Print one entity in `format` (`Auto` means a field listing)
pub fn print_one<T: Tabular>(item: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(item).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id => println!("{}", item.to_row().id),
        OutputFormat::Csv => write_csv(&[item.to_row()], T::FIELDS)?,
        OutputFormat::Table => println!("{}", render_table(&[item.to_row()], T::FIELDS)),
        OutputFormat::Auto => {
            let row = item.to_row();
            println!("{}", style("─".repeat(60)).dim());
            for column in T::FIELDS {
                if let Some(value) = row.get(column.key) {
                    println!("{}: {}", style(column.header).bold(), value.styled());
                }
            }
            println!("{}", style("─".repeat(60)).dim());
        }
    }
    Ok(())
}

/// Render rows as a plain-text table
pub fn render_table(rows: &[TableRow], columns: &[ColumnDef]) -> String {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.header.to_string()));
    for row in rows {
        builder.push_record(columns.iter().map(|c| {
            row.get(c.key)
                .map(CellValue::display)
                .unwrap_or_default()
        }));
    }
    builder.build().with(Style::psql()).to_string()
}

fn write_csv(rows: &[TableRow], columns: &[ColumnDef]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer
        .write_record(columns.iter().map(|c| c.key))
        .into_diagnostic()?;
    for row in rows {
        writer
            .write_record(
                columns
                    .iter()
                    .map(|c| row.get(c.key).map(CellValue::raw).unwrap_or_default()),
            )
            .into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vm() -> Vm {
        let mut vm = Vm::new("superior");
        vm.id = EntityId::new(4);
        vm.ram = 16;
        vm.ip = "10.1.2.3".into();
        vm.groups = vec![EntityId::new(7), EntityId::new(9)];
        vm
    }

    #[test]
    fn test_vm_row_has_every_field() {
        let row = sample_vm().to_row();
        for column in Vm::FIELDS {
            assert!(row.get(column.key).is_some(), "missing {}", column.key);
        }
        for column in Vm::COLUMNS {
            assert!(row.get(column.key).is_some(), "missing {}", column.key);
        }
    }

    #[test]
    fn test_cell_formatting() {
        assert_eq!(CellValue::FileRef(None).display(), "-");
        assert_eq!(CellValue::FileRef(None).raw(), "");
        let ids = CellValue::Ids(vec![EntityId::new(7), EntityId::new(9)]);
        assert_eq!(ids.display(), "7, 9");
        assert_eq!(ids.raw(), "7 9");
    }

    #[test]
    fn test_render_table_contains_headers_and_values() {
        let table = render_table(&[sample_vm().to_row()], Vm::COLUMNS);
        assert!(table.contains("NAME"));
        assert!(table.contains("superior"));
        assert!(table.contains("10.1.2.3"));
        assert!(table.contains("stopped"));
    }

    #[test]
    fn test_group_and_file_rows() {
        let group = Group::new("homer").with_members([EntityId::new(1)]);
        let row = group.to_row();
        assert_eq!(row.get("count").map(CellValue::raw).as_deref(), Some("1"));

        let file = File::new("Windows 7.iso", FileType::Iso, 2048);
        let row = file.to_row();
        assert_eq!(row.get("type").map(CellValue::raw).as_deref(), Some("iso"));
        assert_eq!(row.get("size").map(CellValue::raw).as_deref(), Some("2048"));
    }
}
