use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A single free-form resource property.
///
/// Properties live in their own table so each one can carry an
/// encrypted-at-rest flag independently of the resource body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
    /// Encrypted at rest when persisted.
    #[serde(default)]
    pub is_secret: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_secret: false,
        }
    }

    pub fn secret(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_secret: true,
        }
    }
}

/// Which sub-store a resource was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    File,
    Db,
}

impl Origin {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Origin::File)
    }
}

/// A resource together with the sub-store it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Stored<T> {
    pub resource: T,
    pub origin: Origin,
}

impl<T> Stored<T> {
    pub fn file(resource: T) -> Self {
        Self {
            resource,
            origin: Origin::File,
        }
    }

    pub fn db(resource: T) -> Self {
        Self {
            resource,
            origin: Origin::Db,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.origin.is_read_only()
    }
}

/// A durably configured entity: identity provider, user schema, theme, ...
///
/// The serde impls define the on-disk declaration format read by the file
/// store; [`body`](Resource::body) and [`from_parts`](Resource::from_parts)
/// define the database representation, where free-form properties are split
/// out into the property side table.
pub trait Resource: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Discriminator for this resource kind in the shared tables.
    const KIND: &'static str;

    /// Primary key, unique within the kind.
    fn id(&self) -> &str;

    /// Secondary key, unique within the kind.
    fn name(&self) -> &str;

    /// Free-form properties persisted in the property side table.
    fn properties(&self) -> &[Property];

    /// The resource body minus id, name and properties.
    fn body(&self) -> Result<serde_json::Value, StoreError>;

    /// Rebuild a resource from its database representation.
    fn from_parts(
        id: String,
        name: String,
        body: serde_json::Value,
        properties: Vec<Property>,
    ) -> Result<Self, StoreError>;
}
