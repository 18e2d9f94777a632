use std::collections::HashSet;

use tracing::warn;

use crate::db::DbStore;
use crate::error::StoreError;
use crate::file::FileStore;
use crate::resource::{Resource, Stored};

/// Overlay of a mutable database store on an immutable file store.
///
/// Reads hit the database first and fall back to the file store. Writes are
/// refused outright when the target id or name is file-backed, so a
/// deployer can only "override" a file declaration by choosing a different
/// id in the database. The two sub-stores are not serialized against each
/// other on the read path.
pub struct CompositeStore<T> {
    file: FileStore<T>,
    db: DbStore<T>,
}

impl<T: Resource> CompositeStore<T> {
    pub fn new(file: FileStore<T>, db: DbStore<T>) -> Self {
        Self { file, db }
    }

    pub fn file_store(&self) -> &FileStore<T> {
        &self.file
    }

    pub fn db_store(&self) -> &DbStore<T> {
        &self.db
    }

    /// Create a resource in the database store.
    ///
    /// Refused before touching the database when the id or name collides
    /// with a file-backed declaration.
    pub async fn create(&self, resource: &T) -> Result<(), StoreError> {
        if self.file.has(resource.id()) || self.file.has_name(resource.name()) {
            return Err(StoreError::Immutable(format!(
                "{} {:?}/{:?} is declared in the file store",
                T::KIND,
                resource.id(),
                resource.name()
            )));
        }
        self.db.create(resource).await
    }

    /// Get by id: database first, file fallback.
    pub async fn get(&self, id: &str) -> Result<Stored<T>, StoreError> {
        if let Some(resource) = self.db.get(id).await? {
            return Ok(Stored::db(resource));
        }
        self.file
            .get(id)
            .cloned()
            .map(Stored::file)
            .ok_or_else(|| StoreError::NotFound(format!("{} with id {id:?}", T::KIND)))
    }

    /// Get by name: database first, file fallback.
    pub async fn get_by_name(&self, name: &str) -> Result<Stored<T>, StoreError> {
        if let Some(resource) = self.db.get_by_name(name).await? {
            return Ok(Stored::db(resource));
        }
        self.file
            .get_by_name(name)
            .cloned()
            .map(Stored::file)
            .ok_or_else(|| StoreError::NotFound(format!("{} with name {name:?}", T::KIND)))
    }

    /// Union of both stores, unique by id: database entries first, then
    /// file entries not shadowed by a database id.
    ///
    /// A shadowed file entry means someone wrote a database row with a
    /// file-backed id behind the composite's back; it is logged and the
    /// database entry represents the id.
    pub async fn list(&self) -> Result<Vec<Stored<T>>, StoreError> {
        let db_entries = self.db.list().await?;
        let db_ids: HashSet<&str> = db_entries.iter().map(|r| r.id()).collect();

        let mut entries: Vec<Stored<T>> = Vec::with_capacity(db_entries.len() + self.file.len());
        for resource in self.file.list() {
            if db_ids.contains(resource.id()) {
                warn!(
                    kind = T::KIND,
                    id = resource.id(),
                    "file-backed resource is shadowed by a database entry"
                );
                continue;
            }
            entries.push(Stored::file(resource.clone()));
        }
        let mut result: Vec<Stored<T>> = db_entries.into_iter().map(Stored::db).collect();
        result.append(&mut entries);
        Ok(result)
    }

    /// Update a database-backed resource; file-backed ids are immutable.
    pub async fn update(&self, resource: &T) -> Result<(), StoreError> {
        if self.file.has(resource.id()) {
            return Err(StoreError::Immutable(format!(
                "{} with id {:?} is declared in the file store",
                T::KIND,
                resource.id()
            )));
        }
        self.db.update(resource).await
    }

    /// Delete a database-backed resource; file-backed ids are immutable.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if self.file.has(id) {
            return Err(StoreError::Immutable(format!(
                "{} with id {id:?} is declared in the file store",
                T::KIND
            )));
        }
        self.db.delete(id).await
    }
}
