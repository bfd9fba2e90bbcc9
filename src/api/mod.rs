//! API Module
//!
//! HTTP handlers and routing for the resolution layer.
//!
//! # Endpoints
//! - `GET /resolve/:company/:project` - Resolve a project identifier
//! - `GET /resolve/:company/:project/:document` - Resolve a full document path
//! - `GET /exists/:project/:document` - Cached existence answer, no backend call
//! - `POST /prefetch` - Warm the existence cache in the background
//! - `GET /stats` - Store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
