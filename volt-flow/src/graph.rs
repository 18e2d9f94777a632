use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, OnceLock};

use crate::definition::{
    ExecutorConfig, FlowType, GraphDefinition, InputField, NodeDefinition, NodeType,
};
use crate::error::FlowError;
use crate::executor::Executor;

/// Behaviour tag of a validated node.
///
/// Node behaviour is owned by the engine's state machine, which switches on
/// this tag; nodes themselves are data. A task node carries its executor
/// config plus the executor instance once constructed — graphs are
/// immutable, so the instance is shared by every session on the graph and
/// must be safe for concurrent use.
pub enum NodeKind {
    Decision,
    TaskExecution {
        config: ExecutorConfig,
        executor: OnceLock<Arc<dyn Executor>>,
    },
    PromptOnly,
    AuthenticationSuccess,
}

impl std::fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Decision => f.write_str("Decision"),
            NodeKind::TaskExecution { config, executor } => f
                .debug_struct("TaskExecution")
                .field("config", config)
                .field("executor_cached", &executor.get().is_some())
                .finish(),
            NodeKind::PromptOnly => f.write_str("PromptOnly"),
            NodeKind::AuthenticationSuccess => f.write_str("AuthenticationSuccess"),
        }
    }
}

/// One validated step in a flow graph.
#[derive(Debug)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// Successor node ids, in declaration order.
    pub next: Vec<String>,
    /// Inputs this node collects from the user.
    pub input_data: Vec<InputField>,
    is_start_node: bool,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Decision => NodeType::Decision,
            NodeKind::TaskExecution { .. } => NodeType::TaskExecution,
            NodeKind::PromptOnly => NodeType::PromptOnly,
            NodeKind::AuthenticationSuccess => NodeType::AuthenticationSuccess,
        }
    }

    pub fn executor_config(&self) -> Option<&ExecutorConfig> {
        match &self.kind {
            NodeKind::TaskExecution { config, .. } => Some(config),
            _ => None,
        }
    }
}

/// An immutable, validated flow graph.
///
/// Owned by the [`GraphRepository`](crate::GraphRepository) and shared
/// read-only across engine invocations.
#[derive(Debug)]
pub struct Graph {
    id: String,
    flow_type: FlowType,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    start: usize,
}

impl Graph {
    /// Validate a parsed definition into a graph.
    ///
    /// Checks the structural invariants: unique node ids, at most one
    /// explicit start node (the first listed node is the start otherwise),
    /// every `next` reference resolves, no node succeeds itself, kind
    /// constraints (decisions branch, terminals don't, prompts require
    /// input, task nodes name an executor), and at least one terminal node
    /// reachable from the start.
    pub fn from_definition(def: GraphDefinition) -> Result<Self, FlowError> {
        let graph_id = def.id.clone();
        if def.nodes.is_empty() {
            return Err(FlowError::GraphNotInitialized(graph_id));
        }

        let invalid = |message: String| FlowError::GraphValidation {
            graph: graph_id.clone(),
            message,
        };

        let mut index = HashMap::with_capacity(def.nodes.len());
        for (i, node) in def.nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(invalid(format!("duplicate node id {:?}", node.id)));
            }
        }

        let mut start = None;
        for (i, node) in def.nodes.iter().enumerate() {
            if node.is_start_node {
                if start.is_some() {
                    return Err(invalid("more than one start node declared".into()));
                }
                start = Some(i);
            }
        }
        let start = start.unwrap_or(0);

        for node in &def.nodes {
            for next in &node.next {
                if !index.contains_key(next) {
                    return Err(invalid(format!(
                        "node {:?} references unknown successor {next:?}",
                        node.id
                    )));
                }
                if next == &node.id {
                    return Err(invalid(format!("node {:?} is its own successor", node.id)));
                }
            }
            match node.node_type {
                NodeType::Decision => {
                    if node.next.is_empty() {
                        return Err(invalid(format!(
                            "decision node {:?} has no branches",
                            node.id
                        )));
                    }
                }
                NodeType::AuthenticationSuccess => {
                    if !node.next.is_empty() {
                        return Err(invalid(format!(
                            "terminal node {:?} declares successors",
                            node.id
                        )));
                    }
                }
                NodeType::PromptOnly => {
                    if !node.input_data.iter().any(|input| input.required) {
                        return Err(invalid(format!(
                            "prompt node {:?} collects no required input",
                            node.id
                        )));
                    }
                }
                NodeType::TaskExecution => {
                    let has_executor = node
                        .executor
                        .as_ref()
                        .map(|e| !e.name.is_empty())
                        .unwrap_or(false);
                    if !has_executor {
                        return Err(invalid(format!(
                            "task node {:?} names no executor",
                            node.id
                        )));
                    }
                }
            }
        }

        // At least one terminal node must be reachable from the start.
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&NodeDefinition> = VecDeque::new();
        queue.push_back(&def.nodes[start]);
        seen.insert(def.nodes[start].id.as_str());
        let mut terminal_reachable = false;
        while let Some(node) = queue.pop_front() {
            if node.node_type == NodeType::AuthenticationSuccess {
                terminal_reachable = true;
                break;
            }
            for next in &node.next {
                if seen.insert(next.as_str()) {
                    queue.push_back(&def.nodes[index[next.as_str()]]);
                }
            }
        }
        if !terminal_reachable {
            return Err(invalid("no terminal node is reachable from the start".into()));
        }

        let nodes = def
            .nodes
            .into_iter()
            .map(|node| {
                let kind = match node.node_type {
                    NodeType::Decision => NodeKind::Decision,
                    NodeType::PromptOnly => NodeKind::PromptOnly,
                    NodeType::AuthenticationSuccess => NodeKind::AuthenticationSuccess,
                    NodeType::TaskExecution => NodeKind::TaskExecution {
                        // Presence checked above.
                        config: node.executor.unwrap_or_default(),
                        executor: OnceLock::new(),
                    },
                };
                Node {
                    id: node.id,
                    kind,
                    next: node.next,
                    input_data: node.input_data,
                    is_start_node: node.is_start_node,
                }
            })
            .collect();

        Ok(Self {
            id: graph_id,
            flow_type: def.flow_type,
            nodes,
            index,
            start,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow_type
    }

    pub fn get(&self, node_id: &str) -> Option<&Node> {
        self.index.get(node_id).map(|&i| &self.nodes[i])
    }

    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.get(self.start)
    }

    pub fn start_node_id(&self) -> &str {
        &self.nodes[self.start].id
    }

    /// First declared successor of a non-decision node, if any.
    pub fn next_of(&self, node: &Node) -> Option<&Node> {
        node.next.first().and_then(|id| self.get(id))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Project the graph back onto its wire form (id, type, nodes with
    /// id/type/next/inputData/executor).
    pub fn to_definition(&self) -> GraphDefinition {
        GraphDefinition {
            id: self.id.clone(),
            flow_type: self.flow_type,
            nodes: self
                .nodes
                .iter()
                .map(|node| NodeDefinition {
                    id: node.id.clone(),
                    node_type: node.node_type(),
                    next: node.next.clone(),
                    input_data: node.input_data.clone(),
                    executor: node.executor_config().cloned(),
                    is_start_node: node.is_start_node,
                })
                .collect(),
        }
    }
}
