use std::collections::HashMap;
use std::sync::Arc;

use crate::definition::ExecutorConfig;
use crate::error::FlowError;
use crate::executor::{Executor, ExecutorError};

/// Produces executor instances from a node's executor config.
///
/// Factories run at node-materialization time and may perform synchronous
/// configuration lookups (identity-provider credentials, sender names);
/// anything slower belongs in the executor's own `execute`.
pub trait ExecutorFactory: Send + Sync + 'static {
    fn create(&self, config: &ExecutorConfig) -> Result<Arc<dyn Executor>, ExecutorError>;
}

impl<F> ExecutorFactory for F
where
    F: Fn(&ExecutorConfig) -> Result<Arc<dyn Executor>, ExecutorError> + Send + Sync + 'static,
{
    fn create(&self, config: &ExecutorConfig) -> Result<Arc<dyn Executor>, ExecutorError> {
        self(config)
    }
}

/// Name-keyed registry of executor factories.
///
/// Populated once at startup by the embedding application, read-only
/// afterwards. Graph validation checks every task node's executor name
/// against this registry so an unresolvable name is fatal before serving.
#[derive(Default)]
pub struct ExecutorRegistry {
    factories: HashMap<String, Box<dyn ExecutorFactory>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`.
    pub fn register(mut self, name: impl Into<String>, factory: impl ExecutorFactory) -> Self {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Materialize an executor for a task node.
    pub fn resolve(&self, config: &ExecutorConfig) -> Result<Arc<dyn Executor>, FlowError> {
        let factory = self.factories.get(&config.name).ok_or_else(|| {
            FlowError::ConstructingNodeExecutor {
                name: config.name.clone(),
                message: "no factory registered".into(),
            }
        })?;
        factory
            .create(config)
            .map_err(|e| FlowError::ConstructingNodeExecutor {
                name: config.name.clone(),
                message: e.to_string(),
            })
    }
}
