use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use volt_flow::{
    EngineContext, ExecutorRegistry, FlowEngine, FlowStatus, FlowStep, GraphRepository,
};
use volt_session::SessionStore;

use crate::error::ApiError;

/// One flow continuation request.
///
/// The first request of a flow names a `graphId`; every later request
/// carries the `flowId` the first step returned, plus whatever inputs the
/// previous step asked for.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowExecuteRequest {
    pub flow_id: Option<Uuid>,
    pub graph_id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub inputs: HashMap<String, String>,
}

/// Drives flows on behalf of the HTTP handlers.
///
/// The engine stays out of session storage by contract, so this service
/// owns the round-trip: load or create the context, run the engine,
/// persist the context on suspension and destroy it on completion.
/// Requests within one flow are serialized on a per-flow mutex; requests
/// for distinct flows do not contend.
pub struct FlowService {
    graphs: Arc<GraphRepository>,
    engine: FlowEngine,
    sessions: SessionStore<EngineContext>,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl FlowService {
    pub fn new(
        graphs: Arc<GraphRepository>,
        registry: Arc<ExecutorRegistry>,
        sessions: SessionStore<EngineContext>,
    ) -> Self {
        Self {
            graphs,
            engine: FlowEngine::new(registry),
            sessions,
            locks: DashMap::new(),
        }
    }

    pub fn graphs(&self) -> &GraphRepository {
        &self.graphs
    }

    /// Execute one flow continuation request.
    pub async fn execute(&self, request: FlowExecuteRequest) -> Result<FlowStep, ApiError> {
        match request.flow_id {
            Some(flow_id) => self.resume(flow_id, request.inputs).await,
            None => self.start(request).await,
        }
    }

    async fn start(&self, request: FlowExecuteRequest) -> Result<FlowStep, ApiError> {
        let graph_id = request.graph_id.ok_or_else(|| {
            ApiError::InvalidRequest("either flowId or graphId must be provided".into())
        })?;
        let graph = self
            .graphs
            .get(&graph_id)
            .ok_or_else(|| ApiError::GraphNotFound(graph_id.clone()))?;

        let flow_id = Uuid::new_v4();
        let mut ctx = EngineContext::new(flow_id, request.app_id.unwrap_or_default(), graph);
        debug!(%flow_id, graph = %graph_id, "starting flow");

        let step = self.engine.execute(&mut ctx, request.inputs).await?;
        self.settle(flow_id, ctx, &step);
        Ok(step)
    }

    async fn resume(
        &self,
        flow_id: Uuid,
        inputs: HashMap<String, String>,
    ) -> Result<FlowStep, ApiError> {
        // Serialize requests within this flow; the engine itself is
        // re-entrant but a session must see one request at a time.
        let lock = self
            .locks
            .entry(flow_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut ctx = self
            .sessions
            .get(&flow_id)
            .ok_or(ApiError::FlowNotFound(flow_id))?;
        debug!(%flow_id, node = ?ctx.current_node_id, "resuming flow");

        // On an engine error the stored context is left untouched so the
        // caller may retry the same request.
        let step = self.engine.execute(&mut ctx, inputs).await?;
        self.settle(flow_id, ctx, &step);
        Ok(step)
    }

    /// Persist or destroy the context depending on how the step ended.
    /// A failed flow (`ERROR` step) keeps its session so the caller may
    /// resubmit; only completion destroys it.
    fn settle(&self, flow_id: Uuid, ctx: EngineContext, step: &FlowStep) {
        if step.status == FlowStatus::Complete {
            self.sessions.clear(&flow_id);
            self.locks.remove(&flow_id);
        } else {
            self.sessions.add(flow_id, ctx);
        }
    }
}
