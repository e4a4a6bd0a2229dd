//! Patient handlers: the public directory and the caller's own bookings.
//!
//! Every route sits behind the patient-only gate. Directory reads only
//! ever surface approved providers; booking and cancellation are scoped to
//! the authenticated patient.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use uuid::Uuid;

use medibook_core::repositories::BookingInput;

use crate::dto::{
    parse_date, parse_specialization, parse_uuid, AppointmentActionRes, AppointmentRes,
    BookAppointmentReq, DoctorRes, ListDoctorsQuery,
};
use crate::error::ApiResult;
use crate::guard::AuthedAccount;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/patient/doctors",
    params(ListDoctorsQuery),
    responses(
        (status = 200, description = "Approved providers", body = [DoctorRes]),
        (status = 400, description = "Unrecognised specialization")
    )
)]
/// List approved providers, optionally narrowed to one specialization.
///
/// Unapproved profiles never appear here, whatever the filter.
#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<AppState>,
    Query(query): Query<ListDoctorsQuery>,
) -> ApiResult<Json<Vec<DoctorRes>>> {
    let filter = query
        .specialization
        .as_deref()
        .map(parse_specialization)
        .transpose()?;

    let doctors = state.providers.list(filter, false)?;
    Ok(Json(doctors.into_iter().map(DoctorRes::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/patient/doctors/{id}",
    params(("id" = String, Path, description = "Provider profile id")),
    responses(
        (status = 200, description = "The provider, availability included", body = DoctorRes),
        (status = 404, description = "No such approved provider")
    )
)]
/// A single approved provider with their advertised availability.
#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DoctorRes>> {
    let doctor = state.providers.get_approved(id)?;
    Ok(Json(doctor.into()))
}

#[utoipa::path(
    post,
    path = "/api/patient/appointments",
    request_body = BookAppointmentReq,
    responses(
        (status = 201, description = "Appointment booked", body = AppointmentActionRes),
        (status = 400, description = "Validation failure or slot already booked"),
        (status = 404, description = "Doctor not found or not approved")
    )
)]
/// Book an appointment with an approved provider.
///
/// The slot is taken if any non-cancelled appointment already holds the
/// same provider, date, and start time. The consultation fee is copied
/// from the provider at booking time.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(AuthedAccount(account)): Extension<AuthedAccount>,
    Json(req): Json<BookAppointmentReq>,
) -> ApiResult<(StatusCode, Json<AppointmentActionRes>)> {
    let input = BookingInput {
        provider_id: parse_uuid(&req.doctor_id, "doctor")?,
        date: parse_date(&req.appointment_date)?,
        slot: req.time_slot.into_domain()?,
        symptoms: req.symptoms,
    };

    let appointment = state.appointments.book(account.id, input)?;
    Ok((
        StatusCode::CREATED,
        Json(AppointmentActionRes {
            message: "Appointment booked successfully".into(),
            appointment: appointment.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/patient/appointments",
    responses(
        (status = 200, description = "The caller's bookings, newest date first", body = [AppointmentRes])
    )
)]
/// The caller's own bookings, newest date first.
#[axum::debug_handler]
pub async fn my_appointments(
    State(state): State<AppState>,
    Extension(AuthedAccount(account)): Extension<AuthedAccount>,
) -> ApiResult<Json<Vec<AppointmentRes>>> {
    let appointments = state.appointments.list_for_patient(account.id)?;
    Ok(Json(
        appointments.into_iter().map(AppointmentRes::from).collect(),
    ))
}

#[utoipa::path(
    put,
    path = "/api/patient/appointments/{id}/cancel",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentActionRes),
        (status = 400, description = "Appointment already completed"),
        (status = 404, description = "No such appointment owned by the caller")
    )
)]
/// Cancel the caller's own appointment.
///
/// Idempotent on an already-cancelled appointment; a completed one is
/// terminal and stays completed.
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Extension(AuthedAccount(account)): Extension<AuthedAccount>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AppointmentActionRes>> {
    let appointment = state.appointments.cancel(account.id, id)?;
    Ok(Json(AppointmentActionRes {
        message: "Appointment cancelled successfully".into(),
        appointment: appointment.into(),
    }))
}
