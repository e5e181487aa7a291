//! # devreg-domain
//!
//! Pure domain model for the devreg device registry.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error taxonomy, timestamps
//! - Define **Devices** (registered IoT hardware, soft-deletable)
//! - Define **Commands** (acceptance-only requests addressed to a device)
//! - Define **Device state** (read-time projection of a device record)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod device;
pub mod state;
