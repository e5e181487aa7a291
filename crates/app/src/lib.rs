//! # devreg-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceRepository`: active-scoped reads, insert, partial update, soft delete
//!   - `CommandLog`: transient record of accepted commands
//! - Define the **driving/inbound** use-case struct `DeviceService`
//! - Provide **in-process infrastructure** (the bounded command log) that
//!   doesn't need IO
//!
//! ## Dependency rule
//! Depends on `devreg-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod command_log;
pub mod ports;
pub mod services;
