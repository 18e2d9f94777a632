//! Flow engine for Volt.
//!
//! Authentication and registration journeys are declarative directed
//! graphs: decision, task-execution, prompt-only and terminal nodes. The
//! [`GraphRepository`] loads and validates graph definitions at startup;
//! the [`FlowEngine`] drives a per-flow [`EngineContext`] through a graph,
//! delegating task nodes to pluggable [`Executor`]s resolved from the
//! [`ExecutorRegistry`].
//!
//! The engine never blocks on user think-time. Whenever a node needs user
//! input or an external round-trip it returns a [`FlowStep`] describing
//! what the caller must do next; the caller persists the context and the
//! next request resumes where the flow suspended.

mod context;
mod definition;
mod engine;
mod error;
mod executor;
mod graph;
mod registry;
mod repository;
mod response;
mod step;

pub use context::{AuthenticatedUser, EngineContext, NodeContext};
pub use definition::{
    ExecutorConfig, FlowType, GraphDefinition, InputField, NodeDefinition, NodeType,
};
pub use engine::{FlowEngine, DECISION_INPUT};
pub use error::FlowError;
pub use executor::{Executor, ExecutorError, ExecutorResponse, ExecutorResult, ExecutorStatus};
pub use graph::{Graph, Node, NodeKind};
pub use registry::{ExecutorFactory, ExecutorRegistry};
pub use repository::GraphRepository;
pub use response::{NodeResponse, NodeResponseType, NodeStatus};
pub use step::{FlowStatus, FlowStep, StepData, StepType};
