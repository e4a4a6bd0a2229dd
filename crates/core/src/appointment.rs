//! Appointment records and their status lifecycle.
//!
//! An appointment links one patient account and one provider profile to a
//! date and a wall-clock time slot. Status moves through a forward-only
//! machine: `pending → confirmed → completed`, with cancellation allowed
//! while the appointment is still pending or confirmed. `completed` and
//! `cancelled` are terminal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medibook_types::TimeOfDay;

use crate::provider::Specialization;

/// Lifecycle state of an appointment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the lowercase wire form.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether no further transitions are allowed out of this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    /// Whether the forward-only status machine admits `self → next`.
    ///
    /// Same-state updates are allowed so clinical notes can be attached
    /// without moving the status.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        match (self, next) {
            (from, to) if from == to => true,
            (Pending, Confirmed) | (Pending, Cancelled) => true,
            (Confirmed, Completed) | (Confirmed, Cancelled) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state of an appointment. Stored and reported, but no handler
/// transitions it: fees are recorded, never charged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// A booked wall-clock window within a day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

/// A stored appointment document.
///
/// Holds weak id references to the patient account and provider profile;
/// neither owns the appointment. The consultation fee is snapshotted from
/// the provider at booking time, so later fee changes do not retroactively
/// affect existing bookings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub prescription: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub consultation_fee: f64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Patient half of an appointment read model.
#[derive(Clone, Debug, Serialize)]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Provider half of an appointment read model.
#[derive(Clone, Debug, Serialize)]
pub struct ProviderSummary {
    pub id: Uuid,
    pub name: String,
    pub specialization: Specialization,
}

/// Read model of an appointment with both parties joined in.
#[derive(Clone, Debug, Serialize)]
pub struct AppointmentView {
    pub id: Uuid,
    pub patient: PatientSummary,
    pub doctor: ProviderSummary,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub status: AppointmentStatus,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub consultation_fee: f64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_admitted() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
    }

    #[test]
    fn backward_and_terminal_transitions_are_rejected() {
        use AppointmentStatus::*;
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        // Skipping confirmation is not a forward step.
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn same_state_update_is_admitted_for_note_attachment() {
        use AppointmentStatus::*;
        for status in [Pending, Confirmed, Completed, Cancelled] {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn status_serde_uses_lowercase() {
        let json = serde_json::to_string(&AppointmentStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let parsed: AppointmentStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, AppointmentStatus::Cancelled);
    }
}
