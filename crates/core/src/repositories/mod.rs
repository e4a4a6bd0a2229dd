//! Repository services over the document store.
//!
//! Each service owns one slice of the domain and is handed the shared
//! [`crate::Store`] handle at construction. Services are cheap to clone and
//! hold no per-request state.

mod cascade;

pub mod accounts;
pub mod appointments;
pub mod providers;
pub mod stats;

pub use accounts::{AccountService, RegisterInput};
pub use appointments::{AppointmentService, BookingInput, StatusUpdate};
pub use providers::{ProfileUpdate, ProviderService};
pub use stats::{DashboardStats, StatsService};
