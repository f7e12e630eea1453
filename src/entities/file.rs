//! Storage file entity type

use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, EntityKind};
use crate::core::identity::EntityId;

/// What a storage file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FileType {
    /// Installation media
    Iso,
    /// Import/export appliance
    Ova,
    /// Memory dump of a suspended VM
    Memory,
    /// Disk contents
    Disk,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Iso => write!(f, "iso"),
            FileType::Ova => write!(f, "ova"),
            FileType::Memory => write!(f, "memory"),
            FileType::Disk => write!(f, "disk"),
        }
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "iso" => Ok(FileType::Iso),
            "ova" => Ok(FileType::Ova),
            // legacy stores spell these in Spanish
            "memory" | "memoria" => Ok(FileType::Memory),
            "disk" | "disco" => Ok(FileType::Disk),
            _ => Err(format!("Unknown file type: {}", s)),
        }
    }
}

impl TryFrom<String> for FileType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A storage file (ISO, OVA, memory dump or disk image)
///
/// Files are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Unique identifier
    pub id: EntityId,

    /// File name
    pub name: String,

    /// File type
    #[serde(rename = "type")]
    pub file_type: FileType,

    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}

impl Entity for File {
    const KIND: EntityKind = EntityKind::File;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl File {
    pub fn new(name: impl Into<String>, file_type: FileType, size: u64) -> Self {
        Self {
            id: EntityId::default(),
            name: name.into(),
            file_type,
            size,
        }
    }
}

/// Partial-match filter for files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    pub id: Option<EntityId>,
    pub name: Option<String>,
    pub file_type: Option<FileType>,
    pub size: Option<u64>,
}

impl FileFilter {
    pub fn matches(&self, file: &File) -> bool {
        self.id.map_or(true, |id| id == file.id)
            && self.name.as_ref().map_or(true, |n| *n == file.name)
            && self.file_type.map_or(true, |t| t == file.file_type)
            && self.size.map_or(true, |s| s == file.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_serializes_type_correctly() {
        let file = File::new("Debian Bookworm.iso", FileType::Iso, 4096);
        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains(r#""type":"iso""#));
    }

    #[test]
    fn test_file_type_parse() {
        assert_eq!("DISK".parse::<FileType>().unwrap(), FileType::Disk);
        assert_eq!("memoria".parse::<FileType>().unwrap(), FileType::Memory);
        assert!("tarball".parse::<FileType>().is_err());

        let parsed: FileType = serde_json::from_str(r#""ISO""#).unwrap();
        assert_eq!(parsed, FileType::Iso);
    }

    #[test]
    fn test_file_filter() {
        let file = File::new("dump.mem", FileType::Memory, 10);
        assert!(FileFilter {
            file_type: Some(FileType::Memory),
            ..Default::default()
        }
        .matches(&file));
        assert!(!FileFilter {
            file_type: Some(FileType::Iso),
            ..Default::default()
        }
        .matches(&file));
        assert!(!FileFilter {
            size: Some(11),
            ..Default::default()
        }
        .matches(&file));
    }
}
