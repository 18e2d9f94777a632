use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::context::{AuthenticatedUser, NodeContext};
use crate::definition::InputField;

/// What an executor did with its node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutorStatus {
    /// Done; the engine walks to the next node.
    Complete,
    /// The user must supply the listed inputs and the node re-executes.
    UserInputRequired,
    /// The user must be sent to an external party (IdP, payment page)
    /// and the node re-executes on the callback.
    ExternalRedirection,
    /// The user should retry the same node (bad OTP, expired code).
    Retry,
    /// Terminal failure of the whole flow; not an engine error.
    Failure,
}

/// An executor's answer for one invocation.
#[derive(Clone, Debug, Default)]
pub struct ExecutorResponse {
    pub status: Option<ExecutorStatus>,
    /// Inputs the user must still supply.
    pub required_data: Vec<InputField>,
    /// Opaque key/values the client should echo back.
    pub additional_data: HashMap<String, String>,
    pub redirect_url: Option<String>,
    /// Opaque state forwarded to later executors in this flow.
    pub runtime_data: HashMap<String, String>,
    pub authenticated_user: Option<AuthenticatedUser>,
    /// Bearer-of-truth string produced by terminal executors.
    pub assertion: Option<String>,
    pub failure_reason: Option<String>,
}

impl ExecutorResponse {
    pub fn complete() -> Self {
        Self {
            status: Some(ExecutorStatus::Complete),
            ..Self::default()
        }
    }

    pub fn input_required(required_data: Vec<InputField>) -> Self {
        Self {
            status: Some(ExecutorStatus::UserInputRequired),
            required_data,
            ..Self::default()
        }
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Self {
            status: Some(ExecutorStatus::ExternalRedirection),
            redirect_url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn retry() -> Self {
        Self {
            status: Some(ExecutorStatus::Retry),
            ..Self::default()
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            status: Some(ExecutorStatus::Failure),
            failure_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user: AuthenticatedUser) -> Self {
        self.authenticated_user = Some(user);
        self
    }

    pub fn with_assertion(mut self, assertion: impl Into<String>) -> Self {
        self.assertion = Some(assertion.into());
        self
    }

    pub fn with_additional_data(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.additional_data.insert(key.into(), value.into());
        self
    }

    pub fn with_runtime_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.runtime_data.insert(key.into(), value.into());
        self
    }
}

/// Error type executors report; the engine wraps it into its own taxonomy.
pub type ExecutorError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one executor invocation.
pub type ExecutorResult = Result<ExecutorResponse, ExecutorError>;

/// A pluggable task handler.
///
/// Executors are the open set of the engine: credential checks, OTP
/// senders, federated-login round-trips, provisioning. One instance is
/// cached per task node for the lifetime of its (immutable) graph and is
/// shared across sessions, so implementations must be safe for concurrent
/// use. Only executors talk to the network; they must honour cancellation
/// of the request they run under and release their resources when dropped.
pub trait Executor: Send + Sync + 'static {
    /// The registered executor name.
    fn name(&self) -> &str;

    /// Run against a transient snapshot of the flow. The snapshot must not
    /// be retained past the call.
    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
    ) -> Pin<Box<dyn Future<Output = ExecutorResult> + Send + 'a>>;
}
