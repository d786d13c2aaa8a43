//! Persistent client-side key/value storage.
//!
//! The client reads its bearer token from the `token` key on every request.
//! [`FileStorage`] keeps all keys in one JSON object on disk; [`MemoryStorage`]
//! is a process-local stand-in for embedding and tests.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::runtime::Runtime;

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

const STORAGE_DIR: &str = "apisvc";
const STORAGE_FILE: &str = "local_storage.json";

#[cfg_attr(test, mockall::automock)]
pub trait Storage: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent or the
    /// store cannot be read.
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// JSON-file backed storage.
pub struct FileStorage<R: Runtime> {
    runtime: R,
    path: PathBuf,
}

impl<R: Runtime> FileStorage<R> {
    pub fn new(runtime: R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    /// Storage at `<config_dir>/apisvc/local_storage.json`.
    pub fn in_config_dir(runtime: R) -> Result<Self> {
        let config_dir = runtime
            .config_dir()
            .context("Could not determine the user configuration directory")?;
        let path = config_dir.join(STORAGE_DIR).join(STORAGE_FILE);
        Ok(Self::new(runtime, path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.runtime.exists(&self.path) {
            return Ok(BTreeMap::new());
        }
        let content = self.runtime.read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse storage file {:?}", self.path))
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            self.runtime.create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(items).context("Failed to serialize storage")?;

        // Write to a sibling then rename so a crash never leaves half a file.
        let tmp_path = self.path.with_extension("json.tmp");
        self.runtime.write(&tmp_path, json.as_bytes())?;
        self.runtime.rename(&tmp_path, &self.path)?;
        debug!("Saved {} storage item(s) to {:?}", items.len(), self.path);
        Ok(())
    }
}

impl<R: Runtime> Storage for FileStorage<R> {
    #[tracing::instrument(skip(self))]
    fn get_item(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut items) => items.remove(key),
            Err(e) => {
                warn!("Ignoring unreadable storage {:?}: {:#}", self.path, e);
                None
            }
        }
    }

    #[tracing::instrument(skip(self, value))]
    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.load()?;
        items.insert(key.to_string(), value.to_string());
        self.save(&items)
    }

    #[tracing::instrument(skip(self))]
    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.load()?;
        if items.remove(key).is_none() {
            return Ok(());
        }
        self.save(&items)
    }
}

/// In-memory storage; contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let storage = Self::new();
        storage.insert(TOKEN_KEY, token);
        storage
    }

    fn insert(&self, key: &str, value: &str) {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}
