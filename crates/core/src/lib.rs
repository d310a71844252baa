//! VetDesk Core - Shared types library.
//!
//! This crate provides the types used by the VetDesk front end:
//! - `admin` - The clinic web front end (server-rendered)
//! - `integration-tests` - End-to-end tests against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session handling. Every record it describes is owned by the
//! remote clinic API; these types only mirror the wire format.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, statuses, and prices
//! - [`validation`] - Presentation-level form validators

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{FormErrors, ValidationError};
