//! JSON snapshot of the store under the XDG state dir, rewritten on every mutation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{KeyValueStore, StoreError};

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStore {
    #[serde(default = "default_version")]
    version: u8,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

fn default_version() -> u8 {
    1
}

/// File-backed store: `~/.local/state/subguard/state.json` by default.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Default path for the state file.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("subguard")?;
        Ok(xdg_dirs.get_state_home().join("state.json"))
    }

    /// Open the store at the default path.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open (or start empty) at the given path. A missing file is an empty
    /// store; an unreadable or unparsable one is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    entries: BTreeMap::new(),
                })
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read state: {}", path.display()))
            }
        };
        let snapshot: PersistedStore = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse state: {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            entries = snapshot.entries.len(),
            "opened state file"
        );
        Ok(Self {
            path,
            entries: snapshot.entries,
        })
    }

    /// Like [`open`](Self::open), but an unreadable or corrupt file yields an
    /// empty store at the same path. The next write replaces the bad file.
    pub fn open_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::open(path).unwrap_or_else(|err| {
            tracing::warn!(
                path = %path.display(),
                "state file unusable, starting empty: {err:#}"
            );
            Self {
                path: path.to_path_buf(),
                entries: BTreeMap::new(),
            }
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let snapshot = PersistedStore {
            version: 1,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}
