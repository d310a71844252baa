//! Domain models held by the front end itself.
//!
//! Clinic records live in [`crate::backend`]; only the signed-in identity is
//! kept between requests.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
