//! HTTP API: server, routing, and request/response mapping.

pub mod alert;
pub mod app;
pub mod archive;
pub mod config;
pub mod context;
pub mod middleware;
