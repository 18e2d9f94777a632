use std::collections::HashMap;
use std::marker::PhantomData;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::error::StoreError;
use crate::resource::{Property, Resource};

/// Create the shared resource tables.
///
/// One row per resource plus a property side table so each property can
/// carry its own encrypted-at-rest flag.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS resource (
             id   TEXT NOT NULL,
             kind TEXT NOT NULL,
             name TEXT NOT NULL,
             body TEXT NOT NULL,
             PRIMARY KEY (kind, id)
         )",
    )
    .execute(pool)
    .await
    .map_err(StoreError::database)?;
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS resource_kind_name ON resource (kind, name)",
    )
    .execute(pool)
    .await
    .map_err(StoreError::database)?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS resource_property (
             resource_id TEXT NOT NULL,
             kind        TEXT NOT NULL,
             name        TEXT NOT NULL,
             value       TEXT NOT NULL,
             is_secret   INTEGER NOT NULL DEFAULT 0,
             PRIMARY KEY (kind, resource_id, name)
         )",
    )
    .execute(pool)
    .await
    .map_err(StoreError::database)?;
    Ok(())
}

/// Mutable SQL-backed resource store.
///
/// Every mutation runs in a single transaction with explicit rollback on
/// each error path; a rollback failure is joined into the returned error so
/// both are observable.
pub struct DbStore<T> {
    pool: SqlitePool,
    _marker: PhantomData<T>,
}

impl<T> Clone for DbStore<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Resource> DbStore<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new resource and its properties.
    pub async fn create(&self, resource: &T) -> Result<(), StoreError> {
        let body = serialize_body(resource)?;
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;

        let existing = sqlx::query("SELECT id FROM resource WHERE kind = ? AND (id = ? OR name = ?)")
            .bind(T::KIND)
            .bind(resource.id())
            .bind(resource.name())
            .fetch_optional(&mut *tx)
            .await;
        match existing {
            Err(e) => return Err(fail(tx, e).await),
            Ok(Some(_)) => {
                let conflict = StoreError::Conflict(format!(
                    "{} with id {:?} or name {:?} already exists",
                    T::KIND,
                    resource.id(),
                    resource.name()
                ));
                return Err(rollback_then(tx, conflict).await);
            }
            Ok(None) => {}
        }

        if let Err(e) = sqlx::query("INSERT INTO resource (id, kind, name, body) VALUES (?, ?, ?, ?)")
            .bind(resource.id())
            .bind(T::KIND)
            .bind(resource.name())
            .bind(&body)
            .execute(&mut *tx)
            .await
        {
            return Err(fail(tx, e).await);
        }
        if let Err(e) = insert_properties(&mut tx, resource).await {
            return Err(fail(tx, e).await);
        }
        tx.commit().await.map_err(StoreError::database)
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        let row = sqlx::query("SELECT id, name, body FROM resource WHERE kind = ? AND id = ?")
            .bind(T::KIND)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::database)?;
        match row {
            None => Ok(None),
            Some(row) => self.hydrate(row).await.map(Some),
        }
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<T>, StoreError> {
        let row = sqlx::query("SELECT id, name, body FROM resource WHERE kind = ? AND name = ?")
            .bind(T::KIND)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::database)?;
        match row {
            None => Ok(None),
            Some(row) => self.hydrate(row).await.map(Some),
        }
    }

    pub async fn list(&self) -> Result<Vec<T>, StoreError> {
        let rows = sqlx::query("SELECT id, name, body FROM resource WHERE kind = ? ORDER BY id")
            .bind(T::KIND)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::database)?;
        let prop_rows = sqlx::query(
            "SELECT resource_id, name, value, is_secret FROM resource_property WHERE kind = ? ORDER BY name",
        )
        .bind(T::KIND)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;

        let mut properties: HashMap<String, Vec<Property>> = HashMap::new();
        for row in prop_rows {
            let resource_id: String = row.try_get("resource_id").map_err(StoreError::database)?;
            properties
                .entry(resource_id)
                .or_default()
                .push(property_from_row(&row)?);
        }

        let mut resources = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(StoreError::database)?;
            let name: String = row.try_get("name").map_err(StoreError::database)?;
            let body = parse_body::<T>(&id, &row)?;
            let props = properties.remove(&id).unwrap_or_default();
            resources.push(T::from_parts(id, name, body, props)?);
        }
        Ok(resources)
    }

    /// Replace a resource and its properties.
    pub async fn update(&self, resource: &T) -> Result<(), StoreError> {
        let body = serialize_body(resource)?;
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;

        match sqlx::query("SELECT id FROM resource WHERE kind = ? AND id = ?")
            .bind(T::KIND)
            .bind(resource.id())
            .fetch_optional(&mut *tx)
            .await
        {
            Err(e) => return Err(fail(tx, e).await),
            Ok(None) => {
                let missing = StoreError::NotFound(format!(
                    "{} with id {:?}",
                    T::KIND,
                    resource.id()
                ));
                return Err(rollback_then(tx, missing).await);
            }
            Ok(Some(_)) => {}
        }

        match sqlx::query("SELECT id FROM resource WHERE kind = ? AND name = ? AND id <> ?")
            .bind(T::KIND)
            .bind(resource.name())
            .bind(resource.id())
            .fetch_optional(&mut *tx)
            .await
        {
            Err(e) => return Err(fail(tx, e).await),
            Ok(Some(_)) => {
                let conflict = StoreError::Conflict(format!(
                    "{} name {:?} is already taken",
                    T::KIND,
                    resource.name()
                ));
                return Err(rollback_then(tx, conflict).await);
            }
            Ok(None) => {}
        }

        if let Err(e) = sqlx::query("UPDATE resource SET name = ?, body = ? WHERE kind = ? AND id = ?")
            .bind(resource.name())
            .bind(&body)
            .bind(T::KIND)
            .bind(resource.id())
            .execute(&mut *tx)
            .await
        {
            return Err(fail(tx, e).await);
        }
        if let Err(e) = sqlx::query("DELETE FROM resource_property WHERE kind = ? AND resource_id = ?")
            .bind(T::KIND)
            .bind(resource.id())
            .execute(&mut *tx)
            .await
        {
            return Err(fail(tx, e).await);
        }
        if let Err(e) = insert_properties(&mut tx, resource).await {
            return Err(fail(tx, e).await);
        }
        tx.commit().await.map_err(StoreError::database)
    }

    /// Remove a resource and its properties.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;

        match sqlx::query("DELETE FROM resource WHERE kind = ? AND id = ?")
            .bind(T::KIND)
            .bind(id)
            .execute(&mut *tx)
            .await
        {
            Err(e) => return Err(fail(tx, e).await),
            Ok(result) if result.rows_affected() == 0 => {
                let missing = StoreError::NotFound(format!("{} with id {id:?}", T::KIND));
                return Err(rollback_then(tx, missing).await);
            }
            Ok(_) => {}
        }
        if let Err(e) = sqlx::query("DELETE FROM resource_property WHERE kind = ? AND resource_id = ?")
            .bind(T::KIND)
            .bind(id)
            .execute(&mut *tx)
            .await
        {
            return Err(fail(tx, e).await);
        }
        tx.commit().await.map_err(StoreError::database)
    }

    async fn hydrate(&self, row: SqliteRow) -> Result<T, StoreError> {
        let id: String = row.try_get("id").map_err(StoreError::database)?;
        let name: String = row.try_get("name").map_err(StoreError::database)?;
        let body = parse_body::<T>(&id, &row)?;
        let properties = self.properties_of(&id).await?;
        T::from_parts(id, name, body, properties)
    }

    async fn properties_of(&self, id: &str) -> Result<Vec<Property>, StoreError> {
        let rows = sqlx::query(
            "SELECT name, value, is_secret FROM resource_property
             WHERE kind = ? AND resource_id = ? ORDER BY name",
        )
        .bind(T::KIND)
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;
        rows.iter().map(property_from_row).collect()
    }
}

async fn insert_properties<T: Resource>(
    tx: &mut Transaction<'_, Sqlite>,
    resource: &T,
) -> Result<(), sqlx::Error> {
    for property in resource.properties() {
        sqlx::query(
            "INSERT INTO resource_property (resource_id, kind, name, value, is_secret)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(resource.id())
        .bind(T::KIND)
        .bind(&property.name)
        .bind(&property.value)
        .bind(property.is_secret)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn serialize_body<T: Resource>(resource: &T) -> Result<String, StoreError> {
    let body = resource.body()?;
    serde_json::to_string(&body)
        .map_err(|e| StoreError::Internal(format!("cannot serialize {} body: {e}", T::KIND)))
}

fn parse_body<T: Resource>(id: &str, row: &SqliteRow) -> Result<serde_json::Value, StoreError> {
    let body: String = row.try_get("body").map_err(StoreError::database)?;
    serde_json::from_str(&body)
        .map_err(|e| StoreError::Internal(format!("corrupt {} body for {id:?}: {e}", T::KIND)))
}

fn property_from_row(row: &SqliteRow) -> Result<Property, StoreError> {
    Ok(Property {
        name: row.try_get("name").map_err(StoreError::database)?,
        value: row.try_get("value").map_err(StoreError::database)?,
        is_secret: row.try_get("is_secret").map_err(StoreError::database)?,
    })
}

/// Roll back and wrap the driver error.
async fn fail(tx: Transaction<'_, Sqlite>, err: sqlx::Error) -> StoreError {
    rollback_then(tx, StoreError::database(err)).await
}

/// Roll back before returning `err`; a rollback failure joins the error.
async fn rollback_then(tx: Transaction<'_, Sqlite>, err: StoreError) -> StoreError {
    match tx.rollback().await {
        Ok(()) => err,
        Err(rb) => StoreError::Internal(format!("{err}; rollback also failed: {rb}")),
    }
}
