//! Wire DTOs and their conversions from core read models.
//!
//! Request bodies keep enum-valued and id fields as strings and parse them
//! in the handlers, so an unrecognised value comes back as a 400 with a
//! message rather than a body-rejection. Response DTOs are built from the
//! core view structs and never expose credentials.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use medibook_core::{
    AccountView, AppointmentStatus, AppointmentView, AvailabilitySlot, DashboardStats, DayOfWeek,
    ProviderView, Role, Specialization, TimeOfDay, TimeSlot,
};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// PARSE HELPERS
// ============================================================================

pub(crate) fn parse_uuid(input: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(input).map_err(|_| ApiError::bad_request(format!("invalid {what} id")))
}

pub(crate) fn parse_date(input: &str) -> ApiResult<NaiveDate> {
    input
        .parse()
        .map_err(|_| ApiError::bad_request("invalid appointment date (expected YYYY-MM-DD)"))
}

pub(crate) fn parse_time(input: &str) -> ApiResult<TimeOfDay> {
    TimeOfDay::parse(input).map_err(|e| ApiError::bad_request(e.to_string()))
}

pub(crate) fn parse_role(input: &str) -> ApiResult<Role> {
    Role::parse(input).ok_or_else(|| ApiError::bad_request(format!("unrecognised role {input:?}")))
}

pub(crate) fn parse_specialization(input: &str) -> ApiResult<Specialization> {
    Specialization::parse(input)
        .ok_or_else(|| ApiError::bad_request(format!("unrecognised specialization {input:?}")))
}

pub(crate) fn parse_day(input: &str) -> ApiResult<DayOfWeek> {
    DayOfWeek::parse(input)
        .ok_or_else(|| ApiError::bad_request(format!("unrecognised day {input:?}")))
}

pub(crate) fn parse_status(input: &str) -> ApiResult<AppointmentStatus> {
    AppointmentStatus::parse(input)
        .ok_or_else(|| ApiError::bad_request(format!("unrecognised status {input:?}")))
}

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterReq {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// One of `patient`, `doctor`, `admin`. Defaults to `patient`.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileReq {
    /// Display form, e.g. `"General Medicine"`.
    pub specialization: String,
    pub experience_years: i32,
    pub qualifications: String,
    pub consultation_fee: f64,
    #[serde(default)]
    pub bio: Option<String>,
    /// Filename reference returned by the upload endpoint; stored verbatim.
    #[serde(default)]
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SlotReq {
    /// Display form, e.g. `"Monday"`.
    pub day: String,
    /// Wall-clock `HH:MM`.
    pub start_time: String,
    /// Wall-clock `HH:MM`.
    pub end_time: String,
    #[serde(default)]
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetSlotsReq {
    pub available_slots: Vec<SlotReq>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TimeSlotReq {
    /// Wall-clock `HH:MM`.
    pub start_time: String,
    /// Wall-clock `HH:MM`.
    pub end_time: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookAppointmentReq {
    pub doctor_id: String,
    /// `YYYY-MM-DD`.
    pub appointment_date: String,
    pub time_slot: TimeSlotReq,
    #[serde(default)]
    pub symptoms: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    /// One of `pending`, `confirmed`, `completed`, `cancelled`.
    pub status: String,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub prescription: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListDoctorsQuery {
    /// Narrow the listing to one specialization (display form).
    pub specialization: Option<String>,
}

impl SlotReq {
    pub(crate) fn into_domain(self) -> ApiResult<AvailabilitySlot> {
        Ok(AvailabilitySlot {
            day: parse_day(&self.day)?,
            start_time: parse_time(&self.start_time)?,
            end_time: parse_time(&self.end_time)?,
            is_available: self.is_available.unwrap_or(true),
        })
    }
}

impl TimeSlotReq {
    pub(crate) fn into_domain(self) -> ApiResult<TimeSlot> {
        Ok(TimeSlot {
            start_time: parse_time(&self.start_time)?,
            end_time: parse_time(&self.end_time)?,
        })
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountRes {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub created_at: String,
}

impl From<AccountView> for AccountRes {
    fn from(view: AccountView) -> Self {
        Self {
            id: view.id.to_string(),
            name: view.name,
            email: view.email,
            phone: view.phone,
            role: view.role.as_str().into(),
            created_at: view.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthRes {
    pub success: bool,
    pub token: String,
    pub user: AccountRes,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeRes {
    pub success: bool,
    pub user: AccountRes,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotRes {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

impl From<AvailabilitySlot> for SlotRes {
    fn from(slot: AvailabilitySlot) -> Self {
        Self {
            day: slot.day.as_str().into(),
            start_time: slot.start_time.to_string(),
            end_time: slot.end_time.to_string(),
            is_available: slot.is_available,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorRes {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub experience_years: i32,
    pub qualifications: String,
    pub consultation_fee: f64,
    pub bio: String,
    pub profile_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_slots: Option<Vec<SlotRes>>,
    pub is_approved: bool,
    pub rating: f32,
    pub rating_count: u32,
    pub created_at: String,
}

impl From<ProviderView> for DoctorRes {
    fn from(view: ProviderView) -> Self {
        Self {
            id: view.id.to_string(),
            account_id: view.account_id.to_string(),
            name: view.name,
            email: view.email,
            phone: view.phone,
            specialization: view.specialization.as_str().into(),
            experience_years: view.experience_years,
            qualifications: view.qualifications,
            consultation_fee: view.consultation_fee,
            bio: view.bio,
            profile_image: view.profile_image,
            available_slots: view
                .available_slots
                .map(|slots| slots.into_iter().map(SlotRes::from).collect()),
            is_approved: view.is_approved,
            rating: view.rating,
            rating_count: view.rating_count,
            created_at: view.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorActionRes {
    pub message: String,
    pub doctor: DoctorRes,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimeSlotRes {
    pub start_time: String,
    pub end_time: String,
}

impl From<TimeSlot> for TimeSlotRes {
    fn from(slot: TimeSlot) -> Self {
        Self {
            start_time: slot.start_time.to_string(),
            end_time: slot.end_time.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentPatientRes {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentDoctorRes {
    pub id: String,
    pub name: String,
    pub specialization: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentRes {
    pub id: String,
    pub patient: AppointmentPatientRes,
    pub doctor: AppointmentDoctorRes,
    pub appointment_date: String,
    pub time_slot: TimeSlotRes,
    pub status: String,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub consultation_fee: f64,
    pub payment_status: String,
    pub created_at: String,
}

impl From<AppointmentView> for AppointmentRes {
    fn from(view: AppointmentView) -> Self {
        Self {
            id: view.id.to_string(),
            patient: AppointmentPatientRes {
                id: view.patient.id.to_string(),
                name: view.patient.name,
                email: view.patient.email,
                phone: view.patient.phone,
            },
            doctor: AppointmentDoctorRes {
                id: view.doctor.id.to_string(),
                name: view.doctor.name,
                specialization: view.doctor.specialization.as_str().into(),
            },
            appointment_date: view.date.to_string(),
            time_slot: view.slot.into(),
            status: view.status.as_str().into(),
            symptoms: view.symptoms,
            diagnosis: view.diagnosis,
            prescription: view.prescription,
            notes: view.notes,
            consultation_fee: view.consultation_fee,
            payment_status: match view.payment_status {
                medibook_core::PaymentStatus::Pending => "pending".into(),
                medibook_core::PaymentStatus::Paid => "paid".into(),
                medibook_core::PaymentStatus::Refunded => "refunded".into(),
            },
            created_at: view.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentActionRes {
    pub message: String,
    pub appointment: AppointmentRes,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsRes {
    pub total_doctors: u64,
    pub total_patients: u64,
    pub total_appointments: u64,
    pub pending_appointments: u64,
}

impl From<DashboardStats> for StatsRes {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_doctors: stats.total_doctors,
            total_patients: stats.total_patients,
            total_appointments: stats.total_appointments,
            pending_appointments: stats.pending_appointments,
        }
    }
}
