//! VetDesk clinic front end.
//!
//! Server-rendered pages for clinic staff and pet owners. All records live in
//! the remote clinic API; this crate holds only the signed-in session.
//!
//! # Modules
//!
//! - [`backend`] - Clinic API client and per-resource service wrappers
//! - [`session`] - Session store with persistent and browser-session media
//! - [`middleware`] - Auth extractors, request IDs, security headers
//! - [`routes`] - Page handlers
//! - [`components`] - Shared view pieces (alerts, nav, selects, search)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod backend;
pub mod components;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;

pub use app::build_router;
