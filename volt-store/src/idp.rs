use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::resource::{Property, Resource};

/// An identity provider configuration.
///
/// The flagship composite-store resource kind: executor factories look up
/// the provider named in a task node's executor config to obtain client
/// credentials, scopes and endpoints. Secrets (client secret, API keys)
/// belong in `properties` with `is_secret` set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProvider {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Provider type, e.g. `GOOGLE`, `GITHUB`, `OIDC`.
    #[serde(rename = "type", default)]
    pub idp_type: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl IdentityProvider {
    /// Look up a property value by name.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

impl Resource for IdentityProvider {
    const KIND: &'static str = "identity_provider";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> &[Property] {
        &self.properties
    }

    fn body(&self) -> Result<serde_json::Value, StoreError> {
        Ok(serde_json::json!({
            "description": self.description,
            "type": self.idp_type,
        }))
    }

    fn from_parts(
        id: String,
        name: String,
        body: serde_json::Value,
        properties: Vec<Property>,
    ) -> Result<Self, StoreError> {
        let description = body
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let idp_type = body
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            id,
            name,
            description,
            idp_type,
            properties,
        })
    }
}
