//! HTTP API: configuration, routing, the access gate, and server bootstrap.

pub mod app;
pub mod config;
pub mod middleware;
pub mod server;
pub mod state;
