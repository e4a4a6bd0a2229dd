//! Route handlers, grouped by role prefix.

pub mod admin;
pub mod auth;
pub mod doctor;
pub mod patient;
