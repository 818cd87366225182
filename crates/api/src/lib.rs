//! HTTP API: routing, session extraction and request/response mapping for the
//! sales order engine.

pub mod app;
pub mod context;
pub mod middleware;
