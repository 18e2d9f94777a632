use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::context::EngineContext;
use crate::definition::InputField;
use crate::error::FlowError;
use crate::graph::{Node, NodeKind};
use crate::registry::ExecutorRegistry;
use crate::response::{NodeResponse, NodeResponseType, NodeStatus};
use crate::step::FlowStep;

/// Reserved input name a caller uses to pick a decision branch.
pub const DECISION_INPUT: &str = "decision";

/// The flow interpreter.
///
/// Stateless and re-entrant: all per-flow state lives in the
/// [`EngineContext`], so concurrent invocations against distinct flows
/// cannot interfere. Requests within one flow must be serialized by the
/// caller, which owns the session-store round-trip.
///
/// An invocation advances the context node-by-node until the flow either
/// terminates or needs something from the user; suspension is always
/// expressed as a returned [`FlowStep`], never by blocking.
pub struct FlowEngine {
    registry: Arc<ExecutorRegistry>,
}

impl FlowEngine {
    pub fn new(registry: Arc<ExecutorRegistry>) -> Self {
        Self { registry }
    }

    /// Advance a flow with this request's user input.
    ///
    /// The input map is shallow-merged into the context before the state
    /// machine runs. On return the context reflects all progress made; an
    /// `Err` leaves the context usable so the caller may retry the same
    /// request.
    pub async fn execute(
        &self,
        ctx: &mut EngineContext,
        user_input: HashMap<String, String>,
    ) -> Result<FlowStep, FlowError> {
        // A finished flow replays its terminal step without touching the
        // context; a task node may legally end a branch with no successor,
        // and re-entering it would re-run its executor.
        if ctx.completed {
            let assertion = ctx
                .current_node_response
                .as_ref()
                .and_then(|r| r.assertion.clone());
            return Ok(FlowStep::complete(ctx.flow_id, assertion));
        }

        ctx.merge_user_input(user_input);
        let graph = Arc::clone(&ctx.graph);

        let mut node: &Node = match &ctx.current_node_id {
            None => graph
                .start_node()
                .ok_or_else(|| FlowError::GraphNotInitialized(graph.id().to_string()))?,
            Some(id) => graph.get(id).ok_or_else(|| FlowError::GraphValidation {
                graph: graph.id().to_string(),
                message: format!("context points at unknown node {id:?}"),
            })?,
        };
        ctx.current_node_id = Some(node.id.clone());

        loop {
            match &node.kind {
                NodeKind::TaskExecution { config, executor } => {
                    let executor = match executor.get() {
                        Some(cached) => Arc::clone(cached),
                        // Materialize once; the instance is cached on the
                        // node for the lifetime of the graph.
                        None => {
                            let built = self.registry.resolve(config)?;
                            Arc::clone(executor.get_or_init(|| built))
                        }
                    };

                    let node_ctx = ctx.node_context(node);
                    debug!(
                        flow_id = %ctx.flow_id,
                        node = %node.id,
                        executor = %config.name,
                        "executing task node"
                    );
                    let response = executor.execute(&node_ctx).await.map_err(|e| {
                        FlowError::NodeExecutorExecError {
                            node: node.id.clone(),
                            message: e.to_string(),
                        }
                    })?;
                    if response.status.is_none() {
                        return Err(FlowError::NodeResponseStatusNotFound(node.id.clone()));
                    }

                    let node_response = NodeResponse::from(response);
                    ctx.merge_runtime_data(&node_response.runtime_data);

                    match (node_response.status, node_response.response_type) {
                        (NodeStatus::Complete, _) => {
                            if let Some(user) = &node_response.authenticated_user {
                                // Last writer wins.
                                ctx.authenticated_user = Some(user.clone());
                            }
                            let next = graph.next_of(node);
                            ctx.current_node_response = Some(node_response);
                            match next {
                                Some(next_node) => {
                                    ctx.current_node_id = Some(next_node.id.clone());
                                    node = next_node;
                                }
                                None => {
                                    debug!(flow_id = %ctx.flow_id, node = %node.id, "flow completed at final task node");
                                    ctx.completed = true;
                                    let assertion = ctx
                                        .current_node_response
                                        .as_ref()
                                        .and_then(|r| r.assertion.clone());
                                    return Ok(FlowStep::complete(ctx.flow_id, assertion));
                                }
                            }
                        }
                        (
                            NodeStatus::Incomplete,
                            NodeResponseType::View | NodeResponseType::Retry,
                        ) => {
                            // The node stays current and re-executes with
                            // the inputs the next request brings.
                            let step = self.view_step(ctx, node, &node_response)?;
                            ctx.current_node_response = Some(node_response);
                            return Ok(step);
                        }
                        (NodeStatus::Incomplete, NodeResponseType::Redirection) => {
                            let step = self.redirect_step(ctx, node, &node_response)?;
                            ctx.current_node_response = Some(node_response);
                            return Ok(step);
                        }
                        (NodeStatus::Failure, _) => {
                            let reason = node_response
                                .failure_reason
                                .clone()
                                .unwrap_or_else(|| "flow failed".to_string());
                            ctx.current_node_response = Some(node_response);
                            warn!(
                                flow_id = %ctx.flow_id,
                                node = %node.id,
                                reason = %reason,
                                "executor reported terminal failure"
                            );
                            return Ok(FlowStep::error(ctx.flow_id, reason));
                        }
                        (NodeStatus::Incomplete, NodeResponseType::None) => {
                            return Err(FlowError::UnsupportedResponseType(node.id.clone()));
                        }
                        (NodeStatus::PromptOnly, _) => {
                            return Err(FlowError::UnsupportedResponseStatus(node.id.clone()));
                        }
                    }
                }

                NodeKind::Decision => {
                    match ctx.user_input.get(DECISION_INPUT).cloned() {
                        Some(branch) if node.next.contains(&branch) => {
                            // Consume the choice so a later decision node
                            // prompts on its own.
                            ctx.user_input.remove(DECISION_INPUT);
                            let next = graph.get(&branch).ok_or_else(|| {
                                FlowError::MovingToNextNode {
                                    node: node.id.clone(),
                                    next: branch.clone(),
                                }
                            })?;
                            debug!(flow_id = %ctx.flow_id, node = %node.id, branch = %branch, "decision taken");
                            ctx.current_node_id = Some(next.id.clone());
                            node = next;
                        }
                        choice => {
                            if let Some(invalid) = choice {
                                warn!(flow_id = %ctx.flow_id, node = %node.id, choice = %invalid, "decision input names no branch");
                                ctx.user_input.remove(DECISION_INPUT);
                            }
                            let input = InputField {
                                name: DECISION_INPUT.to_string(),
                                field_type: "string".to_string(),
                                required: true,
                                options: Some(node.next.clone()),
                            };
                            ctx.current_node_response =
                                Some(NodeResponse::prompt(vec![input.clone()]));
                            return Ok(FlowStep::view(ctx.flow_id, vec![input], HashMap::new()));
                        }
                    }
                }

                NodeKind::PromptOnly => {
                    // Advance past the prompt before returning so the next
                    // request executes the successor with the collected
                    // inputs in hand.
                    let next = graph.next_of(node).ok_or_else(|| FlowError::MovingToNextNode {
                        node: node.id.clone(),
                        next: node.next.first().cloned().unwrap_or_default(),
                    })?;
                    let inputs = node.input_data.clone();
                    if inputs.is_empty() {
                        return Err(FlowError::ResolvingStepForPrompt(node.id.clone()));
                    }
                    ctx.current_node_id = Some(next.id.clone());
                    ctx.current_node_response = Some(NodeResponse::prompt(inputs.clone()));
                    return Ok(FlowStep::view(ctx.flow_id, inputs, HashMap::new()));
                }

                NodeKind::AuthenticationSuccess => {
                    ctx.completed = true;
                    let assertion = ctx
                        .current_node_response
                        .as_ref()
                        .and_then(|r| r.assertion.clone());
                    debug!(flow_id = %ctx.flow_id, node = %node.id, "flow completed");
                    return Ok(FlowStep::complete(ctx.flow_id, assertion));
                }
            }
        }
    }

    /// Build the view step for a suspended task node: the executor's
    /// required inputs plus any declared inputs the user has not supplied.
    fn view_step(
        &self,
        ctx: &EngineContext,
        node: &Node,
        response: &NodeResponse,
    ) -> Result<FlowStep, FlowError> {
        let mut inputs = response.required_data.clone();
        for field in &node.input_data {
            let listed = inputs.iter().any(|f| f.name == field.name);
            if !listed && !ctx.user_input.contains_key(&field.name) {
                inputs.push(field.clone());
            }
        }
        if inputs.is_empty() {
            return Err(FlowError::ResolvingStepForPrompt(node.id.clone()));
        }
        Ok(FlowStep::view(
            ctx.flow_id,
            inputs,
            response.additional_data.clone(),
        ))
    }

    fn redirect_step(
        &self,
        ctx: &EngineContext,
        node: &Node,
        response: &NodeResponse,
    ) -> Result<FlowStep, FlowError> {
        let redirect_url = response
            .redirect_url
            .as_deref()
            .ok_or_else(|| FlowError::ResolvingStepForRedirection(node.id.clone()))?;
        Url::parse(redirect_url)
            .map_err(|_| FlowError::ResolvingStepForRedirection(node.id.clone()))?;
        Ok(FlowStep::redirection(
            ctx.flow_id,
            redirect_url,
            response.additional_data.clone(),
        ))
    }
}
