/// Errors produced by the flow engine and graph repository.
///
/// Every variant is either a client error (a bad graph or bad request) or
/// a server error (a wiring bug or a misbehaving executor); the HTTP layer
/// maps the classes to 4xx/5xx. An executor-reported `FAILURE` is not an
/// error — it is a valid terminal step.
#[derive(Debug)]
pub enum FlowError {
    /// The graph declares no nodes.
    GraphNotInitialized(String),
    /// A graph definition file could not be parsed.
    GraphParse { file: String, message: String },
    /// A graph definition violates a structural invariant.
    GraphValidation { graph: String, message: String },
    /// Two graph definitions share an id.
    DuplicateGraph(String),
    /// No factory for the executor name, or the factory failed.
    ConstructingNodeExecutor { name: String, message: String },
    /// The executor itself returned an error.
    NodeExecutorExecError { node: String, message: String },
    /// The executor response carried no status.
    NodeResponseStatusNotFound(String),
    /// A node's successor reference cannot be resolved.
    MovingToNextNode { node: String, next: String },
    /// A redirection response without a usable redirect URL.
    ResolvingStepForRedirection(String),
    /// A prompt with nothing to prompt for.
    ResolvingStepForPrompt(String),
    /// A response status the engine cannot project onto a step.
    UnsupportedResponseStatus(String),
    /// A response type the engine cannot project onto a step.
    UnsupportedResponseType(String),
}

impl FlowError {
    /// Whether the error is the caller's fault (bad input or bad graph)
    /// rather than a server-side bug.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FlowError::GraphNotInitialized(_)
                | FlowError::GraphParse { .. }
                | FlowError::GraphValidation { .. }
                | FlowError::DuplicateGraph(_)
                | FlowError::MovingToNextNode { .. }
        )
    }
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowError::GraphNotInitialized(graph) => {
                write!(f, "flow graph {graph:?} has no nodes")
            }
            FlowError::GraphParse { file, message } => {
                write!(f, "cannot parse flow graph {file}: {message}")
            }
            FlowError::GraphValidation { graph, message } => {
                write!(f, "invalid flow graph {graph:?}: {message}")
            }
            FlowError::DuplicateGraph(id) => write!(f, "duplicate flow graph id {id:?}"),
            FlowError::ConstructingNodeExecutor { name, message } => {
                write!(f, "cannot construct executor {name:?}: {message}")
            }
            FlowError::NodeExecutorExecError { node, message } => {
                write!(f, "executor failed on node {node:?}: {message}")
            }
            FlowError::NodeResponseStatusNotFound(node) => {
                write!(f, "executor on node {node:?} returned no status")
            }
            FlowError::MovingToNextNode { node, next } => {
                write!(f, "cannot move from node {node:?} to {next:?}")
            }
            FlowError::ResolvingStepForRedirection(node) => {
                write!(f, "node {node:?} redirected without a redirect URL")
            }
            FlowError::ResolvingStepForPrompt(node) => {
                write!(f, "node {node:?} prompted without any inputs")
            }
            FlowError::UnsupportedResponseStatus(node) => {
                write!(f, "unsupported response status from node {node:?}")
            }
            FlowError::UnsupportedResponseType(node) => {
                write!(f, "unsupported response type from node {node:?}")
            }
        }
    }
}

impl std::error::Error for FlowError {}
