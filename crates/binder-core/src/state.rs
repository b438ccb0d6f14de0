use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Lifecycle of an app image build.
///
/// A build always enters `Building` first and ends in exactly one of
/// `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildState {
    Building,
    Completed,
    Failed,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Building)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Building => "BUILDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        })
    }
}

/// Persistent build-state record, keyed by app name.
pub trait BuildStateStore: Send + Sync {
    /// `None` if no build was ever attempted for the app.
    fn get(&self, app: &str) -> crate::Result<Option<BuildState>>;

    fn set(&self, app: &str, state: BuildState) -> crate::Result<()>;
}

/// Build states kept in a single JSON document on disk.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> crate::Result<BTreeMap<String, BuildState>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| crate::Error::StateRead {
            path: self.path.clone(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| crate::Error::StateParse {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl BuildStateStore for FileStateStore {
    fn get(&self, app: &str) -> crate::Result<Option<BuildState>> {
        Ok(self.read_all()?.get(app).copied())
    }

    fn set(&self, app: &str, state: BuildState) -> crate::Result<()> {
        let mut states = self.read_all()?;
        states.insert(app.to_owned(), state);

        let write_err = |e| crate::Error::StateWrite {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(&states).map_err(|e| crate::Error::StateParse {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, json).map_err(write_err)?;

        tracing::debug!(app, %state, "build state recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_until_first_build() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileStateStore::new(tmp.path().join("build-state.json"));
        assert_eq!(store.get("demo").unwrap(), None);
    }

    #[test]
    fn states_are_kept_per_app() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileStateStore::new(tmp.path().join("nested/build-state.json"));

        store.set("demo", BuildState::Building).unwrap();
        store.set("other", BuildState::Failed).unwrap();
        store.set("demo", BuildState::Completed).unwrap();

        assert_eq!(store.get("demo").unwrap(), Some(BuildState::Completed));
        assert_eq!(store.get("other").unwrap(), Some(BuildState::Failed));
    }

    #[test]
    fn serialized_as_uppercase() {
        let json = serde_json::to_string(&BuildState::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
        assert!(BuildState::Failed.is_terminal());
        assert!(!BuildState::Building.is_terminal());
    }
}
