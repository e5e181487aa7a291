//! # devreg-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON API** under `/api/v1` (`/devices`, `/devices/{id}`,
//!   `/devices/{id}/commands`, `/devices/{id}/state`, …)
//! - Serve the service banner at `/` and liveness at `/health`
//! - Reject malformed payloads before they reach the application layer
//! - Map application results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `devreg-app` (for port traits and services) and `devreg-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod extract;
pub mod router;
pub mod state;
