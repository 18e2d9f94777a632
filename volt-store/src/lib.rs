//! Composite resource store for Volt.
//!
//! Durable configuration (identity providers, user schemas, themes, ...) is
//! served from two sub-stores with the same CRUD surface: an immutable
//! [`FileStore`] loaded from on-disk declarations at startup and a mutable
//! [`DbStore`]. The [`CompositeStore`] overlays them: reads go to the
//! database first and fall back to the file store; writes against a
//! file-backed id are refused. [`CachedStore`] adds an optional L1
//! read-through front.

mod cached;
mod composite;
mod db;
mod error;
mod file;
mod idp;
mod resource;

pub use cached::CachedStore;
pub use composite::CompositeStore;
pub use db::{init_schema, DbStore};
pub use error::StoreError;
pub use file::FileStore;
pub use idp::IdentityProvider;
pub use resource::{Origin, Property, Resource, Stored};
