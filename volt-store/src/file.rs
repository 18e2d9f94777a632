use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::StoreError;
use crate::resource::Resource;

/// Read-only resource store populated from a directory of JSON declarations.
///
/// Loaded once at startup; a file that fails to parse or a duplicate id is
/// fatal rather than served partially. The resource id comes from the file
/// contents, never the filename.
pub struct FileStore<T> {
    entries: HashMap<String, T>,
    by_name: HashMap<String, String>,
}

impl<T: Resource> FileStore<T> {
    /// Scan `dir` for `*.json` files, one resource per file.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        let mut store = Self::empty();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            StoreError::Internal(format!("cannot read {} directory {}: {e}", T::KIND, dir.display()))
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| {
                StoreError::Internal(format!("cannot read {} directory entry: {e}", T::KIND))
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| {
                StoreError::Internal(format!("cannot read {}: {e}", path.display()))
            })?;
            let resource: T = serde_json::from_str(&content).map_err(|e| {
                StoreError::Internal(format!("cannot parse {}: {e}", path.display()))
            })?;
            debug!(kind = T::KIND, id = resource.id(), file = %path.display(), "loaded resource declaration");
            store.insert(resource)?;
        }
        Ok(store)
    }

    /// Build a store from already-parsed resources. Duplicate ids or names
    /// are rejected like duplicates across files.
    pub fn from_resources(resources: Vec<T>) -> Result<Self, StoreError> {
        let mut store = Self::empty();
        for resource in resources {
            store.insert(resource)?;
        }
        Ok(store)
    }

    /// An empty store, for deployments without file-backed declarations.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    fn insert(&mut self, resource: T) -> Result<(), StoreError> {
        let id = resource.id().to_string();
        let name = resource.name().to_string();
        if self.entries.contains_key(&id) {
            return Err(StoreError::Conflict(format!(
                "duplicate {} id {id:?} in file store",
                T::KIND
            )));
        }
        if self.by_name.contains_key(&name) {
            return Err(StoreError::Conflict(format!(
                "duplicate {} name {name:?} in file store",
                T::KIND
            )));
        }
        self.by_name.insert(name, id.clone());
        self.entries.insert(id, resource);
        Ok(())
    }

    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.by_name.get(name).and_then(|id| self.entries.get(id))
    }

    pub fn list(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
