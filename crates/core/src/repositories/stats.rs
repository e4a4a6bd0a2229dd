//! Dashboard aggregation.
//!
//! Pure reads: every call recounts from the current collections, so the
//! numbers always equal direct counts taken at the same instant. Nothing
//! is cached.

use std::sync::Arc;

use serde::Serialize;

use crate::account::{Account, Role};
use crate::appointment::{Appointment, AppointmentStatus};
use crate::error::ClinicResult;
use crate::provider::Provider;
use crate::store::{Collection, Store};

/// Admin dashboard counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_doctors: u64,
    pub total_patients: u64,
    pub total_appointments: u64,
    pub pending_appointments: u64,
}

/// Service producing the admin dashboard counters.
#[derive(Clone)]
pub struct StatsService {
    store: Arc<Store>,
}

impl StatsService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn dashboard(&self) -> ClinicResult<DashboardStats> {
        let providers: Vec<Provider> = self.store.scan(Collection::Providers)?;
        let accounts: Vec<Account> = self.store.scan(Collection::Accounts)?;
        let appointments: Vec<Appointment> = self.store.scan(Collection::Appointments)?;

        Ok(DashboardStats {
            total_doctors: providers.len() as u64,
            total_patients: accounts.iter().filter(|a| a.role == Role::Patient).count() as u64,
            total_appointments: appointments.len() as u64,
            pending_appointments: appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Pending)
                .count() as u64,
        })
    }
}
