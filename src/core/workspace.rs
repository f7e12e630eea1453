//! Durable working state for the command line
//!
//! A workspace is one SQLite store holding the snapshot stack plus the live
//! state under [`CURRENT_KEY`]. Each command opens it, works on the
//! [`Manager`] and calls [`Workspace::save`] if it changed anything.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::error::ModelError;
use crate::core::generator::GeneratorSizes;
use crate::core::identity::EntityId;
use crate::core::manager::Manager;
use crate::core::state::State;
use crate::core::store::{KvStore, SqliteStore};

/// Key holding the working state
pub const CURRENT_KEY: &str = "current";

/// Key holding the id counter
pub const NEXT_ID_KEY: &str = "next_id";

/// An opened store with its working state loaded
pub struct Workspace {
    path: PathBuf,
    manager: Manager<SqliteStore>,
}

impl Workspace {
    /// Open an initialized store
    pub fn open(path: &Path) -> Result<Self, WorkspaceError> {
        let store = Self::open_store(path)?;
        let state = Self::read_current(path, &store)?;
        let next_id = match store.get(NEXT_ID_KEY)? {
            Some(raw) => raw
                .trim()
                .parse::<EntityId>()
                .map_err(|_| WorkspaceError::Corrupt(format!("bad id counter '{}'", raw)))?,
            None => EntityId::default(),
        };

        let mut manager = Manager::new(store);
        manager.init(Some(state))?;
        manager.reserve_ids_below(next_id);

        debug!(path = %path.display(), next_id = %manager.next_id(), "workspace opened");
        Ok(Self {
            path: path.to_path_buf(),
            manager,
        })
    }

    /// Read the stored working state without validating it
    pub fn load_raw(path: &Path) -> Result<State, WorkspaceError> {
        let store = Self::open_store(path)?;
        Self::read_current(path, &store)
    }

    fn open_store(path: &Path) -> Result<SqliteStore, WorkspaceError> {
        if !path.exists() {
            return Err(WorkspaceError::NotInitialized(path.to_path_buf()));
        }
        Ok(SqliteStore::open(path)?)
    }

    fn read_current(path: &Path, store: &SqliteStore) -> Result<State, WorkspaceError> {
        let raw = store
            .get(CURRENT_KEY)?
            .ok_or_else(|| WorkspaceError::NotInitialized(path.to_path_buf()))?;
        Ok(State::from_json(&raw).map_err(ModelError::from)?)
    }

    /// Create or reset the working state
    ///
    /// Without `state` a random inventory of the given `sizes` is generated.
    /// Existing snapshots are kept; an existing working state is only
    /// replaced when `force` is set.
    pub fn create(
        path: &Path,
        state: Option<State>,
        sizes: GeneratorSizes,
        force: bool,
    ) -> Result<Self, WorkspaceError> {
        let store = SqliteStore::open(path)?;
        if !force && store.get(CURRENT_KEY)?.is_some() {
            return Err(WorkspaceError::AlreadyExists(path.to_path_buf()));
        }

        let mut manager = Manager::new(store).with_generator_sizes(sizes);
        manager.init(state)?;

        let mut workspace = Self {
            path: path.to_path_buf(),
            manager,
        };
        workspace.save()?;
        Ok(workspace)
    }

    /// Persist the working state and the id counter
    pub fn save(&mut self) -> Result<(), WorkspaceError> {
        let json = self.manager.state().to_json().map_err(ModelError::from)?;
        let next_id = self.manager.next_id().to_string();

        let store = self.manager.store_mut();
        store.set(CURRENT_KEY, &json)?;
        store.set(NEXT_ID_KEY, &next_id)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manager(&self) -> &Manager<SqliteStore> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut Manager<SqliteStore> {
        &mut self.manager
    }
}

/// Errors that can occur while opening or saving a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("no working state in {0:?}. Run 'vmanager init' to create one.")]
    NotInitialized(PathBuf),

    #[error("a working state already exists in {0:?}. Use --force to replace it.")]
    AlreadyExists(PathBuf),

    #[error("store is corrupt: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<rusqlite::Error> for WorkspaceError {
    fn from(e: rusqlite::Error) -> Self {
        WorkspaceError::Model(ModelError::from(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Vm;
    use tempfile::tempdir;

    fn small() -> GeneratorSizes {
        GeneratorSizes {
            vms: 3,
            groups: 2,
            files: 1,
        }
    }

    #[test]
    fn test_open_without_init_fails() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.db");
        let err = Workspace::open(&path).err().unwrap();
        assert!(matches!(err, WorkspaceError::NotInitialized(_)));

        // an empty store is not initialized either
        SqliteStore::open(&path).unwrap();
        let err = Workspace::open(&path).err().unwrap();
        assert!(matches!(err, WorkspaceError::NotInitialized(_)));
    }

    #[test]
    fn test_create_then_open_roundtrips() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.db");

        let created = Workspace::create(&path, None, small(), false).unwrap();
        let state = created.manager().export_state();
        drop(created);

        let opened = Workspace::open(&path).unwrap();
        assert_eq!(opened.manager().export_state(), state);
        assert_eq!(opened.manager().next_id(), EntityId::new(6));
    }

    #[test]
    fn test_create_refuses_to_clobber() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.db");
        Workspace::create(&path, None, small(), false).unwrap();

        let err = Workspace::create(&path, None, small(), false).err().unwrap();
        assert!(matches!(err, WorkspaceError::AlreadyExists(_)));

        let reset = Workspace::create(&path, Some(State::new("empty")), small(), true).unwrap();
        assert!(reset.manager().state().is_empty());
    }

    #[test]
    fn test_ids_survive_removal_between_runs() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.db");
        Workspace::create(&path, Some(State::new("t")), small(), false).unwrap();

        let mut ws = Workspace::open(&path).unwrap();
        let added = ws.manager_mut().add_vm(Vm::new("a")).unwrap();
        ws.manager_mut().rm_vm(added.id).unwrap();
        ws.save().unwrap();

        let mut ws = Workspace::open(&path).unwrap();
        let again = ws.manager_mut().add_vm(Vm::new("b")).unwrap();
        assert!(again.id > added.id);
    }

    #[test]
    fn test_inconsistent_store_loads_raw_only() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.db");
        let mut store = SqliteStore::open(&path).unwrap();
        store
            .set(
                CURRENT_KEY,
                r#"{"name":"bad","vms":[{"id":1,"name":"v","groups":[9]}]}"#,
            )
            .unwrap();
        drop(store);

        let err = Workspace::open(&path).err().unwrap();
        assert!(matches!(
            err,
            WorkspaceError::Model(ModelError::Inconsistent(_))
        ));

        let raw = Workspace::load_raw(&path).unwrap();
        assert_eq!(raw.vms[0].groups, vec![EntityId::new(9)]);
    }

    #[test]
    fn test_snapshots_survive_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.db");
        let mut ws = Workspace::create(&path, Some(State::new("t")), small(), false).unwrap();
        let token = ws.manager_mut().save_state().unwrap();
        drop(ws);

        let ws = Workspace::open(&path).unwrap();
        assert_eq!(ws.manager().snapshot_tokens().unwrap(), vec![token]);
    }

    #[test]
    fn test_workspace_keys_are_not_restorable() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.db");
        let mut ws = Workspace::create(&path, Some(State::new("t")), small(), false).unwrap();

        for key in [CURRENT_KEY, NEXT_ID_KEY] {
            let err = ws.manager_mut().restore_state(Some(key)).unwrap_err();
            assert!(err.is_not_found(), "{key}: {err}");
        }
        assert_eq!(ws.manager().state().name, "t");
    }
}
