use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::definition::GraphDefinition;
use crate::error::FlowError;
use crate::graph::Graph;
use crate::registry::ExecutorRegistry;

/// Holds every flow graph known to the deployment.
///
/// Populated once at startup from a directory of JSON definitions and
/// read-only afterwards. Any unparsable file, invalid graph, duplicate id
/// or unresolvable executor name is fatal: the platform refuses to start
/// rather than serve a partial set.
pub struct GraphRepository {
    graphs: HashMap<String, Arc<Graph>>,
}

impl GraphRepository {
    /// Scan `dir` for `*.json` graph definitions.
    pub fn load_dir(dir: impl AsRef<Path>, registry: &ExecutorRegistry) -> Result<Self, FlowError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| FlowError::GraphParse {
            file: dir.display().to_string(),
            message: e.to_string(),
        })?;
        let mut definitions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FlowError::GraphParse {
                file: dir.display().to_string(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| FlowError::GraphParse {
                file: path.display().to_string(),
                message: e.to_string(),
            })?;
            let definition: GraphDefinition =
                serde_json::from_str(&content).map_err(|e| FlowError::GraphParse {
                    file: path.display().to_string(),
                    message: e.to_string(),
                })?;
            debug!(graph = %definition.id, file = %path.display(), "parsed flow graph definition");
            definitions.push(definition);
        }
        Self::from_definitions(definitions, registry)
    }

    /// Validate and register already-parsed definitions.
    pub fn from_definitions(
        definitions: Vec<GraphDefinition>,
        registry: &ExecutorRegistry,
    ) -> Result<Self, FlowError> {
        let mut graphs = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            let graph = Graph::from_definition(definition)?;
            for node in graph.nodes() {
                if let Some(config) = node.executor_config() {
                    if !registry.contains(&config.name) {
                        return Err(FlowError::GraphValidation {
                            graph: graph.id().to_string(),
                            message: format!(
                                "node {:?} references unregistered executor {:?}",
                                node.id, config.name
                            ),
                        });
                    }
                }
            }
            let id = graph.id().to_string();
            if graphs.insert(id.clone(), Arc::new(graph)).is_some() {
                return Err(FlowError::DuplicateGraph(id));
            }
        }
        info!(count = graphs.len(), "registered flow graphs");
        Ok(Self { graphs })
    }

    pub fn get(&self, graph_id: &str) -> Option<Arc<Graph>> {
        self.graphs.get(graph_id).cloned()
    }

    /// All registered graphs, sorted by id.
    pub fn list(&self) -> Vec<Arc<Graph>> {
        let mut graphs: Vec<Arc<Graph>> = self.graphs.values().cloned().collect();
        graphs.sort_by(|a, b| a.id().cmp(b.id()));
        graphs
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}
