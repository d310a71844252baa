//! Typed records exchanged with the clinic API.
//!
//! Field names are `camelCase` on the wire.

mod appointment;
mod auth;
pub mod common;
mod consultation;
mod dashboard;
mod pet;
mod service;
mod triage;
mod user;

pub use appointment::{Appointment, AppointmentInput, Decorator, NewDecorator, StatusChange};
pub use auth::{
    AuthPayload, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RefreshRequest,
    RegisterRequest, ResetPasswordRequest,
};
pub use common::display_datetime;
pub use consultation::{Consultation, ConsultationInput};
pub use dashboard::{DashboardStats, InventoryAlert};
pub use pet::{Pet, PetInput};
pub use service::{ClinicService, ServiceInput};
pub use triage::{Triage, TriageInput, sort_by_urgency};
pub use user::{NewUser, User, UserUpdate};
