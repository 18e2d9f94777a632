//! HTTP surface for Volt.
//!
//! The [`FlowService`] owns the session-store round-trip the engine
//! deliberately stays out of: load-or-create the context, serialize
//! requests within one flow, invoke the engine, persist or destroy the
//! context depending on the step. [`router`] exposes the service as a
//! plain axum application.

pub mod config;

mod error;
mod handlers;
mod service;

pub use config::{AppConfig, ConfigError};
pub use error::ApiError;
pub use handlers::router;
pub use service::{FlowExecuteRequest, FlowService};
