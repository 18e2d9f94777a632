//! Volt — an identity platform built around declarative flow graphs.
//!
//! This facade crate re-exports the Volt sub-crates through a single
//! dependency:
//!
//! | Module          | Crate          | What it holds                          |
//! |-----------------|----------------|----------------------------------------|
//! | [`flow`]        | `volt-flow`    | Graphs, engine, executor protocol      |
//! | [`session`]     | `volt-session` | TTL store for in-flight flow contexts  |
//! | [`cache`]       | `volt-cache`   | L1 cache and per-type provider         |
//! | [`store`]       | `volt-store`   | Composite file/database resource store |
//! | [`oauth`]       | `volt-oauth`   | PKCE helpers for executors             |
//! | [`http`]        | `volt-http`    | Flow execution service and handlers    |
//!
//! # Example
//!
//! ```ignore
//! use volt::flow::{ExecutorRegistry, FlowEngine, GraphRepository};
//! use volt::http::{router, AppConfig, FlowService};
//! use volt::session::SessionStore;
//!
//! let registry = std::sync::Arc::new(my_executors());
//! let graphs = GraphRepository::load_dir("graphs", registry.as_ref())?;
//! let service = FlowService::new(
//!     std::sync::Arc::new(graphs),
//!     registry,
//!     SessionStore::new(),
//! );
//! let app = router(std::sync::Arc::new(service));
//! ```

pub use volt_cache as cache;
pub use volt_flow as flow;
pub use volt_http as http;
pub use volt_oauth as oauth;
pub use volt_session as session;
pub use volt_store as store;
