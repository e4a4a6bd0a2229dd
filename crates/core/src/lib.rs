//! # Medibook Core
//!
//! Core business logic for the medibook appointment platform.
//!
//! This crate contains pure data operations over a file-backed document
//! store:
//! - Account registration and credential verification
//! - The provider directory (doctor profiles, availability, approval)
//! - The booking ledger (appointments and their status lifecycle)
//! - Dashboard aggregation counts
//!
//! **No API concerns**: Authentication tokens, HTTP servers, and wire DTOs
//! belong in `api-rest`.

pub mod account;
pub mod appointment;
pub mod config;
pub mod credential;
pub mod error;
pub mod provider;
pub mod repositories;
pub mod store;

pub use account::{Account, AccountView, Role};
pub use appointment::{
    Appointment, AppointmentStatus, AppointmentView, PaymentStatus, TimeSlot,
};
pub use config::CoreConfig;
pub use credential::CredentialHash;
pub use error::{ClinicError, ClinicResult};
pub use provider::{AvailabilitySlot, DayOfWeek, Provider, ProviderView, Specialization};
pub use repositories::{
    AccountService, AppointmentService, BookingInput, DashboardStats, ProfileUpdate,
    ProviderService, RegisterInput, StatsService, StatusUpdate,
};
pub use store::{Collection, RetryPolicy, Store};

// Re-exported so downstream crates share one set of validated value types.
pub use medibook_types::{EmailAddress, NonEmptyText, TextError, TimeOfDay};
