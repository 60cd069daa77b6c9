//! Todo server
//!
//! Serves a todo list kept in a master/replica key-value store, together with
//! a health endpoint that probes every store endpoint and Prometheus metrics
//! with the per-role endpoint counts.
//!
//! # Endpoints
//!
//! - `GET /health`: `label -> status` mapping, always containing `"self": "ok"`
//! - `GET /metrics`: store topology gauges
//! - `GET /todos`, `POST /todos`, `DELETE /todos`: the todo list

pub mod config;
pub mod http_server;
pub mod server;

pub use config::{Config, ConfigError};
pub use http_server::{AppState, HttpServer, router};
pub use server::TodoServer;
