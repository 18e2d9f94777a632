use std::collections::HashMap;

use crate::context::AuthenticatedUser;
use crate::definition::InputField;
use crate::executor::{ExecutorResponse, ExecutorStatus};

/// Engine-level status of the node most recently acted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStatus {
    Complete,
    Incomplete,
    /// The engine itself is prompting (decision or prompt-only node).
    PromptOnly,
    Failure,
}

/// How an incomplete node suspended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeResponseType {
    None,
    View,
    Redirection,
    Retry,
}

/// The engine's record of what the current node last produced.
#[derive(Clone, Debug)]
pub struct NodeResponse {
    pub status: NodeStatus,
    pub response_type: NodeResponseType,
    pub required_data: Vec<InputField>,
    pub additional_data: HashMap<String, String>,
    pub redirect_url: Option<String>,
    pub runtime_data: HashMap<String, String>,
    pub authenticated_user: Option<AuthenticatedUser>,
    pub assertion: Option<String>,
    pub failure_reason: Option<String>,
}

impl NodeResponse {
    /// A response synthesized by the engine itself when a decision or
    /// prompt-only node asks the user for input.
    pub(crate) fn prompt(required_data: Vec<InputField>) -> Self {
        Self {
            status: NodeStatus::PromptOnly,
            response_type: NodeResponseType::View,
            required_data,
            additional_data: HashMap::new(),
            redirect_url: None,
            runtime_data: HashMap::new(),
            authenticated_user: None,
            assertion: None,
            failure_reason: None,
        }
    }
}

impl From<ExecutorResponse> for NodeResponse {
    /// Map an executor's status onto the node-response taxonomy:
    ///
    /// | Executor               | Status     | Type        |
    /// |------------------------|------------|-------------|
    /// | `Complete`             | Complete   | None        |
    /// | `UserInputRequired`    | Incomplete | View        |
    /// | `ExternalRedirection`  | Incomplete | Redirection |
    /// | `Retry`                | Incomplete | Retry       |
    /// | `Failure`              | Failure    | None        |
    /// | unset                  | Incomplete | None        |
    ///
    /// An unset status cannot be projected onto a step; the engine rejects
    /// it after this conversion.
    fn from(response: ExecutorResponse) -> Self {
        let (status, response_type) = match response.status {
            Some(ExecutorStatus::Complete) => (NodeStatus::Complete, NodeResponseType::None),
            Some(ExecutorStatus::UserInputRequired) => {
                (NodeStatus::Incomplete, NodeResponseType::View)
            }
            Some(ExecutorStatus::ExternalRedirection) => {
                (NodeStatus::Incomplete, NodeResponseType::Redirection)
            }
            Some(ExecutorStatus::Retry) => (NodeStatus::Incomplete, NodeResponseType::Retry),
            Some(ExecutorStatus::Failure) => (NodeStatus::Failure, NodeResponseType::None),
            None => (NodeStatus::Incomplete, NodeResponseType::None),
        };
        Self {
            status,
            response_type,
            required_data: response.required_data,
            additional_data: response.additional_data,
            redirect_url: response.redirect_url,
            runtime_data: response.runtime_data,
            authenticated_user: response.authenticated_user,
            assertion: response.assertion,
            failure_reason: response.failure_reason,
        }
    }
}
