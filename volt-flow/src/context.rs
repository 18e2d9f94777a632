use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::definition::InputField;
use crate::graph::{Graph, Node};
use crate::response::NodeResponse;

/// The identity an executor asserted for this flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub user_id: String,
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            authenticated: true,
            attributes: HashMap::new(),
        }
    }
}

/// Accumulated state of one in-progress flow.
///
/// Created on the first request, mutated exclusively by the engine, and
/// destroyed on completion or session expiry. Between requests it lives in
/// the session store; the engine never holds it across user think-time.
#[derive(Clone, Debug)]
pub struct EngineContext {
    pub flow_id: Uuid,
    pub app_id: String,
    pub graph: Arc<Graph>,
    /// The node the next invocation resumes at; `None` before the first
    /// invocation.
    pub current_node_id: Option<String>,
    /// Everything the user has supplied so far, shallow-merged per request.
    pub user_input: HashMap<String, String>,
    /// Opaque executor-to-executor state, merged after every execution.
    pub runtime_data: HashMap<String, String>,
    pub authenticated_user: Option<AuthenticatedUser>,
    pub current_node_response: Option<NodeResponse>,
    /// Set once the flow reaches a terminal outcome. A completed context
    /// replays its terminal step instead of re-entering any node, so
    /// resubmissions cannot re-trigger executor side effects.
    pub completed: bool,
}

impl EngineContext {
    pub fn new(flow_id: Uuid, app_id: impl Into<String>, graph: Arc<Graph>) -> Self {
        Self {
            flow_id,
            app_id: app_id.into(),
            graph,
            current_node_id: None,
            user_input: HashMap::new(),
            runtime_data: HashMap::new(),
            authenticated_user: None,
            current_node_response: None,
            completed: false,
        }
    }

    pub(crate) fn merge_user_input(&mut self, input: HashMap<String, String>) {
        self.user_input.extend(input);
    }

    pub(crate) fn merge_runtime_data(&mut self, data: &HashMap<String, String>) {
        for (key, value) in data {
            self.runtime_data.insert(key.clone(), value.clone());
        }
    }

    /// Snapshot handed to an executor. Transient by contract: executors
    /// must not retain it past the call.
    pub(crate) fn node_context(&self, node: &Node) -> NodeContext {
        NodeContext {
            flow_id: self.flow_id,
            app_id: self.app_id.clone(),
            node_id: node.id.clone(),
            input_data: node.input_data.clone(),
            user_input: self.user_input.clone(),
            runtime_data: self.runtime_data.clone(),
            authenticated_user: self.authenticated_user.clone(),
            properties: node
                .executor_config()
                .map(|config| config.properties.clone())
                .unwrap_or_default(),
        }
    }
}

/// What an executor sees of the flow when invoked.
#[derive(Clone, Debug)]
pub struct NodeContext {
    pub flow_id: Uuid,
    pub app_id: String,
    pub node_id: String,
    /// Inputs the node declares.
    pub input_data: Vec<InputField>,
    /// Everything the user has supplied so far.
    pub user_input: HashMap<String, String>,
    pub runtime_data: HashMap<String, String>,
    pub authenticated_user: Option<AuthenticatedUser>,
    /// Free-form properties from the node's executor config.
    pub properties: HashMap<String, String>,
}

impl NodeContext {
    /// Convenience: a single user input by name.
    pub fn input(&self, name: &str) -> Option<&str> {
        self.user_input.get(name).map(String::as_str)
    }

    /// Declared inputs the user has not supplied yet.
    pub fn missing_inputs(&self) -> Vec<InputField> {
        self.input_data
            .iter()
            .filter(|field| !self.user_input.contains_key(&field.name))
            .cloned()
            .collect()
    }
}
