//! The booking ledger.
//!
//! Booking runs as a conditional insert under the ledger write guard: the
//! conflict check (same provider, same date, same start time, status not
//! cancelled) and the write happen under one guard, so two concurrent
//! requests for the identical slot cannot both be admitted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::account::Account;
use crate::appointment::{
    Appointment, AppointmentStatus, AppointmentView, PatientSummary, PaymentStatus,
    ProviderSummary, TimeSlot,
};
use crate::error::{ClinicError, ClinicResult};
use crate::provider::Provider;
use crate::store::{Collection, Store};

/// A patient's booking request, already parsed into domain types.
#[derive(Clone, Debug)]
pub struct BookingInput {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub symptoms: Option<String>,
}

/// A doctor's status update with optional clinical text.
#[derive(Clone, Debug)]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

/// Service for the booking ledger.
#[derive(Clone)]
pub struct AppointmentService {
    store: Arc<Store>,
}

impl AppointmentService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Books an appointment for a patient.
    ///
    /// Preconditions: the provider exists and is approved
    /// (`ProviderUnavailable` otherwise), and no non-cancelled appointment
    /// holds the same provider + date + start time (`SlotTaken` otherwise).
    /// The consultation fee is snapshotted from the provider at creation;
    /// later fee changes do not affect this booking.
    pub fn book(&self, patient_id: Uuid, input: BookingInput) -> ClinicResult<AppointmentView> {
        if input.slot.start_time >= input.slot.end_time {
            return Err(ClinicError::Validation(
                "time slot must start before it ends".into(),
            ));
        }

        let provider: Provider = self
            .store
            .get(Collection::Providers, &input.provider_id)?
            .filter(|p: &Provider| p.is_approved)
            .ok_or(ClinicError::ProviderUnavailable)?;

        let appointment = {
            let _guard = self.store.lock_write(Collection::Appointments);

            let ledger: Vec<Appointment> = self.store.scan(Collection::Appointments)?;
            let taken = ledger.iter().any(|a| {
                a.provider_id == input.provider_id
                    && a.date == input.date
                    && a.slot.start_time == input.slot.start_time
                    && a.status != AppointmentStatus::Cancelled
            });
            if taken {
                return Err(ClinicError::SlotTaken);
            }

            let appointment = Appointment {
                id: Uuid::new_v4(),
                patient_id,
                provider_id: input.provider_id,
                date: input.date,
                slot: input.slot,
                status: AppointmentStatus::Pending,
                symptoms: input.symptoms,
                diagnosis: None,
                prescription: None,
                notes: None,
                consultation_fee: provider.consultation_fee,
                payment_status: PaymentStatus::Pending,
                created_at: Utc::now(),
            };
            self.store
                .put(Collection::Appointments, &appointment.id, &appointment)?;
            appointment
        };

        self.view(appointment)
    }

    /// The caller's own bookings, most recent appointment date first.
    pub fn list_for_patient(&self, patient_id: Uuid) -> ClinicResult<Vec<AppointmentView>> {
        let mut own: Vec<Appointment> = self
            .store
            .scan::<Appointment>(Collection::Appointments)?
            .into_iter()
            .filter(|a| a.patient_id == patient_id)
            .collect();
        own.sort_by(|a, b| (b.date, b.slot.start_time).cmp(&(a.date, a.slot.start_time)));
        self.views(own)
    }

    /// Bookings for the profile owned by a doctor account, soonest first
    /// (doctors read their ledger forwards).
    pub fn list_for_provider_account(
        &self,
        account_id: Uuid,
    ) -> ClinicResult<Vec<AppointmentView>> {
        let provider = self.provider_for_account(account_id)?;

        let mut own: Vec<Appointment> = self
            .store
            .scan::<Appointment>(Collection::Appointments)?
            .into_iter()
            .filter(|a| a.provider_id == provider.id)
            .collect();
        own.sort_by(|a, b| (a.date, a.slot.start_time).cmp(&(b.date, b.slot.start_time)));
        self.views(own)
    }

    /// Every appointment in the ledger, most recent date first.
    pub fn list_all(&self) -> ClinicResult<Vec<AppointmentView>> {
        let mut all: Vec<Appointment> = self.store.scan(Collection::Appointments)?;
        all.sort_by(|a, b| (b.date, b.slot.start_time).cmp(&(a.date, a.slot.start_time)));
        self.views(all)
    }

    /// Applies a doctor's status update to an appointment on their own
    /// profile.
    ///
    /// The forward-only machine is enforced here: a transition the status
    /// machine does not admit is a `Validation` failure (see
    /// [`AppointmentStatus::can_transition_to`]).
    pub fn update_status(
        &self,
        doctor_account_id: Uuid,
        appointment_id: Uuid,
        update: StatusUpdate,
    ) -> ClinicResult<AppointmentView> {
        let provider = self.provider_for_account(doctor_account_id)?;

        let _guard = self.store.lock_write(Collection::Appointments);

        let mut appointment: Appointment = self
            .store
            .get(Collection::Appointments, &appointment_id)?
            .filter(|a: &Appointment| a.provider_id == provider.id)
            .ok_or(ClinicError::AppointmentNotFound)?;

        if !appointment.status.can_transition_to(update.status) {
            return Err(ClinicError::Validation(format!(
                "cannot move appointment from {} to {}",
                appointment.status, update.status
            )));
        }

        appointment.status = update.status;
        if let Some(diagnosis) = update.diagnosis {
            appointment.diagnosis = Some(diagnosis);
        }
        if let Some(prescription) = update.prescription {
            appointment.prescription = Some(prescription);
        }
        if let Some(notes) = update.notes {
            appointment.notes = Some(notes);
        }

        self.store
            .put(Collection::Appointments, &appointment.id, &appointment)?;
        drop(_guard);

        self.view(appointment)
    }

    /// Cancels the caller's own appointment.
    ///
    /// Idempotent on an already-cancelled appointment. A completed
    /// appointment is terminal and cannot be cancelled.
    pub fn cancel(&self, patient_id: Uuid, appointment_id: Uuid) -> ClinicResult<AppointmentView> {
        let _guard = self.store.lock_write(Collection::Appointments);

        let mut appointment: Appointment = self
            .store
            .get(Collection::Appointments, &appointment_id)?
            .filter(|a: &Appointment| a.patient_id == patient_id)
            .ok_or(ClinicError::AppointmentNotFound)?;

        if appointment.status == AppointmentStatus::Completed {
            return Err(ClinicError::Validation(
                "a completed appointment cannot be cancelled".into(),
            ));
        }

        if appointment.status != AppointmentStatus::Cancelled {
            appointment.status = AppointmentStatus::Cancelled;
            self.store
                .put(Collection::Appointments, &appointment.id, &appointment)?;
        }
        drop(_guard);

        self.view(appointment)
    }

    fn provider_for_account(&self, account_id: Uuid) -> ClinicResult<Provider> {
        let providers: Vec<Provider> = self.store.scan(Collection::Providers)?;
        providers
            .into_iter()
            .find(|p| p.account_id == account_id)
            .ok_or(ClinicError::ProviderNotFound)
    }

    fn view(&self, appointment: Appointment) -> ClinicResult<AppointmentView> {
        self.views(vec![appointment])?
            .pop()
            .ok_or(ClinicError::AppointmentNotFound)
    }

    /// Joins patient and provider information into read models. Dangling
    /// references (a deleted party) degrade to empty display fields rather
    /// than failing the whole listing.
    fn views(&self, appointments: Vec<Appointment>) -> ClinicResult<Vec<AppointmentView>> {
        let accounts: HashMap<Uuid, Account> = self
            .store
            .scan::<Account>(Collection::Accounts)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let providers: HashMap<Uuid, Provider> = self
            .store
            .scan::<Provider>(Collection::Providers)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(appointments
            .into_iter()
            .map(|appointment| {
                let patient = match accounts.get(&appointment.patient_id) {
                    Some(account) => PatientSummary {
                        id: account.id,
                        name: account.name.to_string(),
                        email: account.email.to_string(),
                        phone: account.phone.clone(),
                    },
                    None => PatientSummary {
                        id: appointment.patient_id,
                        name: String::new(),
                        email: String::new(),
                        phone: String::new(),
                    },
                };

                let doctor = match providers.get(&appointment.provider_id) {
                    Some(provider) => ProviderSummary {
                        id: provider.id,
                        name: accounts
                            .get(&provider.account_id)
                            .map(|a| a.name.to_string())
                            .unwrap_or_default(),
                        specialization: provider.specialization,
                    },
                    None => ProviderSummary {
                        id: appointment.provider_id,
                        name: String::new(),
                        specialization: crate::provider::Specialization::GeneralMedicine,
                    },
                };

                AppointmentView {
                    id: appointment.id,
                    patient,
                    doctor,
                    date: appointment.date,
                    slot: appointment.slot,
                    status: appointment.status,
                    symptoms: appointment.symptoms,
                    diagnosis: appointment.diagnosis,
                    prescription: appointment.prescription,
                    notes: appointment.notes,
                    consultation_fee: appointment.consultation_fee,
                    payment_status: appointment.payment_status,
                    created_at: appointment.created_at,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Role;
    use crate::config::CoreConfig;
    use crate::provider::Specialization;
    use crate::repositories::accounts::{AccountService, RegisterInput};
    use crate::repositories::providers::{ProfileUpdate, ProviderService};
    use crate::store::RetryPolicy;
    use medibook_types::{EmailAddress, NonEmptyText, TimeOfDay};
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        accounts: AccountService,
        providers: ProviderService,
        appointments: AppointmentService,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let cfg = Arc::new(CoreConfig::new(tmp.path().to_path_buf()));
        let store =
            Arc::new(Store::open(cfg, RetryPolicy::default()).expect("open should succeed"));
        Fixture {
            _tmp: tmp,
            accounts: AccountService::new(store.clone()),
            providers: ProviderService::new(store.clone()),
            appointments: AppointmentService::new(store),
        }
    }

    fn register(fixture: &Fixture, email: &str, role: Role) -> Account {
        fixture
            .accounts
            .register(RegisterInput {
                name: NonEmptyText::new("Test Person").unwrap(),
                email: EmailAddress::parse(email).unwrap(),
                password: "password123".into(),
                phone: String::new(),
                role,
            })
            .expect("register should succeed")
    }

    /// Registers a doctor, sets a fee, and approves the profile.
    fn approved_doctor(fixture: &Fixture, email: &str, fee: f64) -> (Account, Uuid) {
        let account = register(fixture, email, Role::Doctor);
        fixture
            .providers
            .update_profile(
                account.id,
                ProfileUpdate {
                    specialization: Specialization::Cardiology,
                    experience_years: 10,
                    qualifications: "MBBS, MD".into(),
                    consultation_fee: fee,
                    bio: None,
                    profile_image: None,
                },
            )
            .expect("update should succeed");
        let profile = fixture
            .providers
            .find_by_account(account.id)
            .expect("profile should exist");
        fixture
            .providers
            .approve(profile.id)
            .expect("approve should succeed");
        (account, profile.id)
    }

    fn booking(provider_id: Uuid, date: &str, start: &str, end: &str) -> BookingInput {
        BookingInput {
            provider_id,
            date: date.parse().expect("date should parse"),
            slot: TimeSlot {
                start_time: TimeOfDay::parse(start).unwrap(),
                end_time: TimeOfDay::parse(end).unwrap(),
            },
            symptoms: Some("persistent cough".into()),
        }
    }

    #[test]
    fn booking_snapshots_the_current_fee() {
        let fx = fixture();
        let patient = register(&fx, "pat@x.com", Role::Patient);
        let (doctor_account, provider_id) = approved_doctor(&fx, "doc@x.com", 500.0);

        let view = fx
            .appointments
            .book(patient.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("booking should succeed");
        assert_eq!(view.consultation_fee, 500.0);
        assert_eq!(view.status, AppointmentStatus::Pending);

        // A later fee change must not reach the existing booking.
        fx.providers
            .update_profile(
                doctor_account.id,
                ProfileUpdate {
                    specialization: Specialization::Cardiology,
                    experience_years: 10,
                    qualifications: "MBBS, MD".into(),
                    consultation_fee: 900.0,
                    bio: None,
                    profile_image: None,
                },
            )
            .expect("update should succeed");

        let listed = fx
            .appointments
            .list_for_patient(patient.id)
            .expect("list should succeed");
        assert_eq!(listed[0].consultation_fee, 500.0);
    }

    #[test]
    fn booking_an_unapproved_provider_fails() {
        let fx = fixture();
        let patient = register(&fx, "pat@x.com", Role::Patient);
        let doctor = register(&fx, "doc@x.com", Role::Doctor);
        let profile = fx
            .providers
            .find_by_account(doctor.id)
            .expect("profile should exist");

        let err = fx
            .appointments
            .book(patient.id, booking(profile.id, "2026-09-07", "09:00", "10:00"))
            .expect_err("unapproved provider should be unbookable");
        assert!(matches!(err, ClinicError::ProviderUnavailable));
    }

    #[test]
    fn second_booking_for_the_same_slot_conflicts() {
        let fx = fixture();
        let first = register(&fx, "a@x.com", Role::Patient);
        let second = register(&fx, "b@x.com", Role::Patient);
        let (_, provider_id) = approved_doctor(&fx, "doc@x.com", 500.0);

        fx.appointments
            .book(first.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("first booking should succeed");

        let err = fx
            .appointments
            .book(second.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect_err("identical slot should conflict");
        assert!(matches!(err, ClinicError::SlotTaken));

        // The first booking is unaffected by the failed attempt.
        let listed = fx
            .appointments
            .list_for_patient(first.id)
            .expect("list should succeed");
        assert_eq!(listed.len(), 1);
        assert_ne!(listed[0].status, AppointmentStatus::Cancelled);
    }

    #[test]
    fn cancelled_bookings_free_the_slot_for_rebooking() {
        let fx = fixture();
        let first = register(&fx, "a@x.com", Role::Patient);
        let second = register(&fx, "b@x.com", Role::Patient);
        let (_, provider_id) = approved_doctor(&fx, "doc@x.com", 500.0);

        let original = fx
            .appointments
            .book(first.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("first booking should succeed");

        fx.appointments
            .cancel(first.id, original.id)
            .expect("cancel should succeed");

        // The same slot is open again once the blocking record is cancelled.
        fx.appointments
            .book(second.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("rebooking a cancelled slot should succeed");
    }

    #[test]
    fn same_start_time_on_a_different_date_does_not_conflict() {
        let fx = fixture();
        let patient = register(&fx, "a@x.com", Role::Patient);
        let (_, provider_id) = approved_doctor(&fx, "doc@x.com", 500.0);

        fx.appointments
            .book(patient.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("first booking should succeed");
        fx.appointments
            .book(patient.id, booking(provider_id, "2026-09-14", "09:00", "10:00"))
            .expect("same slot a week later should succeed");
    }

    #[test]
    fn listings_are_scoped_and_ordered_per_role() {
        let fx = fixture();
        let patient = register(&fx, "a@x.com", Role::Patient);
        let other = register(&fx, "b@x.com", Role::Patient);
        let (doctor_account, provider_id) = approved_doctor(&fx, "doc@x.com", 500.0);

        fx.appointments
            .book(patient.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("booking should succeed");
        fx.appointments
            .book(patient.id, booking(provider_id, "2026-09-21", "09:00", "10:00"))
            .expect("booking should succeed");
        fx.appointments
            .book(other.id, booking(provider_id, "2026-09-14", "09:00", "10:00"))
            .expect("booking should succeed");

        // Patient: own bookings only, newest date first.
        let mine = fx
            .appointments
            .list_for_patient(patient.id)
            .expect("list should succeed");
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|a| a.patient.id == patient.id));
        assert!(mine[0].date > mine[1].date);

        // Doctor: every booking on the profile, soonest first.
        let schedule = fx
            .appointments
            .list_for_provider_account(doctor_account.id)
            .expect("list should succeed");
        assert_eq!(schedule.len(), 3);
        assert!(schedule[0].date < schedule[1].date);
        assert!(schedule[1].date < schedule[2].date);

        // Admin: everything, newest date first.
        let all = fx.appointments.list_all().expect("list should succeed");
        assert_eq!(all.len(), 3);
        assert!(all[0].date > all[1].date && all[1].date > all[2].date);
    }

    #[test]
    fn doctor_walks_the_forward_status_machine() {
        let fx = fixture();
        let patient = register(&fx, "a@x.com", Role::Patient);
        let (doctor_account, provider_id) = approved_doctor(&fx, "doc@x.com", 500.0);

        let appointment = fx
            .appointments
            .book(patient.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("booking should succeed");

        let confirmed = fx
            .appointments
            .update_status(
                doctor_account.id,
                appointment.id,
                StatusUpdate {
                    status: AppointmentStatus::Confirmed,
                    diagnosis: None,
                    prescription: None,
                    notes: None,
                },
            )
            .expect("pending -> confirmed should succeed");
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

        let completed = fx
            .appointments
            .update_status(
                doctor_account.id,
                appointment.id,
                StatusUpdate {
                    status: AppointmentStatus::Completed,
                    diagnosis: Some("bronchitis".into()),
                    prescription: Some("amoxicillin 500mg".into()),
                    notes: Some("review in two weeks".into()),
                },
            )
            .expect("confirmed -> completed should succeed");
        assert_eq!(completed.status, AppointmentStatus::Completed);
        assert_eq!(completed.diagnosis.as_deref(), Some("bronchitis"));
    }

    // Status only moves forward: once a record is completed it can never
    // be pulled back to pending, whatever the caller sends.
    #[test]
    fn backward_status_transitions_are_rejected() {
        let fx = fixture();
        let patient = register(&fx, "a@x.com", Role::Patient);
        let (doctor_account, provider_id) = approved_doctor(&fx, "doc@x.com", 500.0);

        let appointment = fx
            .appointments
            .book(patient.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("booking should succeed");

        for status in [AppointmentStatus::Confirmed, AppointmentStatus::Completed] {
            fx.appointments
                .update_status(
                    doctor_account.id,
                    appointment.id,
                    StatusUpdate {
                        status,
                        diagnosis: None,
                        prescription: None,
                        notes: None,
                    },
                )
                .expect("forward step should succeed");
        }

        let err = fx
            .appointments
            .update_status(
                doctor_account.id,
                appointment.id,
                StatusUpdate {
                    status: AppointmentStatus::Pending,
                    diagnosis: None,
                    prescription: None,
                    notes: None,
                },
            )
            .expect_err("completed -> pending must fail");
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[test]
    fn doctor_cannot_touch_another_providers_appointment() {
        let fx = fixture();
        let patient = register(&fx, "a@x.com", Role::Patient);
        let (_, provider_id) = approved_doctor(&fx, "doc@x.com", 500.0);
        let (other_doctor, _) = approved_doctor(&fx, "other@x.com", 300.0);

        let appointment = fx
            .appointments
            .book(patient.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("booking should succeed");

        let err = fx
            .appointments
            .update_status(
                other_doctor.id,
                appointment.id,
                StatusUpdate {
                    status: AppointmentStatus::Confirmed,
                    diagnosis: None,
                    prescription: None,
                    notes: None,
                },
            )
            .expect_err("foreign appointment should be invisible");
        assert!(matches!(err, ClinicError::AppointmentNotFound));
    }

    #[test]
    fn patient_cancel_is_idempotent_and_owner_scoped() {
        let fx = fixture();
        let patient = register(&fx, "a@x.com", Role::Patient);
        let stranger = register(&fx, "b@x.com", Role::Patient);
        let (_, provider_id) = approved_doctor(&fx, "doc@x.com", 500.0);

        let appointment = fx
            .appointments
            .book(patient.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("booking should succeed");

        let err = fx
            .appointments
            .cancel(stranger.id, appointment.id)
            .expect_err("someone else's appointment should be invisible");
        assert!(matches!(err, ClinicError::AppointmentNotFound));

        let cancelled = fx
            .appointments
            .cancel(patient.id, appointment.id)
            .expect("cancel should succeed");
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

        let again = fx
            .appointments
            .cancel(patient.id, appointment.id)
            .expect("re-cancel is a no-op");
        assert_eq!(again.status, AppointmentStatus::Cancelled);
    }

    #[test]
    fn completed_appointments_cannot_be_cancelled() {
        let fx = fixture();
        let patient = register(&fx, "a@x.com", Role::Patient);
        let (doctor_account, provider_id) = approved_doctor(&fx, "doc@x.com", 500.0);

        let appointment = fx
            .appointments
            .book(patient.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("booking should succeed");

        for status in [AppointmentStatus::Confirmed, AppointmentStatus::Completed] {
            fx.appointments
                .update_status(
                    doctor_account.id,
                    appointment.id,
                    StatusUpdate {
                        status,
                        diagnosis: None,
                        prescription: None,
                        notes: None,
                    },
                )
                .expect("forward step should succeed");
        }

        let err = fx
            .appointments
            .cancel(patient.id, appointment.id)
            .expect_err("completed appointment is terminal");
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[test]
    fn views_join_party_names() {
        let fx = fixture();
        let patient = register(&fx, "a@x.com", Role::Patient);
        let (_, provider_id) = approved_doctor(&fx, "doc@x.com", 500.0);

        let view = fx
            .appointments
            .book(patient.id, booking(provider_id, "2026-09-07", "09:00", "10:00"))
            .expect("booking should succeed");

        assert_eq!(view.patient.email, "a@x.com");
        assert_eq!(view.doctor.id, provider_id);
        assert_eq!(view.doctor.specialization, Specialization::Cardiology);
        assert_eq!(view.doctor.name, "Test Person");
    }
}
