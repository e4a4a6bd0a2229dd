//! Doctor handlers: own profile, availability, and appointment workflow.
//!
//! Every route sits behind the doctor-only gate. Handlers operate on the
//! profile owned by the authenticated account; a doctor cannot reach
//! another provider's profile or appointments through these routes.

use axum::extract::{Path, State};
use axum::response::Json;
use axum::Extension;
use uuid::Uuid;

use medibook_core::repositories::{ProfileUpdate, StatusUpdate};

use crate::dto::{
    parse_specialization, parse_status, AppointmentActionRes, AppointmentRes, DoctorActionRes,
    DoctorRes, SetSlotsReq, UpdateProfileReq, UpdateStatusReq,
};
use crate::error::ApiResult;
use crate::guard::AuthedAccount;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/doctor/profile",
    responses(
        (status = 200, description = "The caller's provider profile", body = DoctorRes),
        (status = 404, description = "The account owns no profile")
    )
)]
/// The caller's own provider profile, availability included.
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(AuthedAccount(account)): Extension<AuthedAccount>,
) -> ApiResult<Json<DoctorRes>> {
    let profile = state.providers.profile_for_account(account.id)?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    put,
    path = "/api/doctor/profile",
    request_body = UpdateProfileReq,
    responses(
        (status = 200, description = "Profile updated", body = DoctorActionRes),
        (status = 400, description = "Validation failure")
    )
)]
/// Update the caller's own profile.
///
/// Rejects negative experience or fee and unrecognised specializations.
/// `profile_image` is stored as an opaque filename reference.
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthedAccount(account)): Extension<AuthedAccount>,
    Json(req): Json<UpdateProfileReq>,
) -> ApiResult<Json<DoctorActionRes>> {
    let update = ProfileUpdate {
        specialization: parse_specialization(&req.specialization)?,
        experience_years: req.experience_years,
        qualifications: req.qualifications,
        consultation_fee: req.consultation_fee,
        bio: req.bio,
        profile_image: req.profile_image,
    };

    let doctor = state.providers.update_profile(account.id, update)?;
    Ok(Json(DoctorActionRes {
        message: "Profile updated successfully".into(),
        doctor: doctor.into(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/doctor/slots",
    request_body = SetSlotsReq,
    responses(
        (status = 200, description = "Availability replaced", body = DoctorActionRes),
        (status = 400, description = "Malformed slot")
    )
)]
/// Replace the caller's weekly availability.
///
/// The submitted list replaces the stored one wholesale; there is no
/// partial merge. Windows may overlap.
#[axum::debug_handler]
pub async fn set_slots(
    State(state): State<AppState>,
    Extension(AuthedAccount(account)): Extension<AuthedAccount>,
    Json(req): Json<SetSlotsReq>,
) -> ApiResult<Json<DoctorActionRes>> {
    let slots = req
        .available_slots
        .into_iter()
        .map(|slot| slot.into_domain())
        .collect::<ApiResult<Vec<_>>>()?;

    let doctor = state.providers.set_availability(account.id, slots)?;
    Ok(Json(DoctorActionRes {
        message: "Available slots updated successfully".into(),
        doctor: doctor.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/doctor/appointments",
    responses(
        (status = 200, description = "Bookings on the caller's profile, soonest first", body = [AppointmentRes])
    )
)]
/// Bookings on the caller's profile, soonest first.
#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(AuthedAccount(account)): Extension<AuthedAccount>,
) -> ApiResult<Json<Vec<AppointmentRes>>> {
    let appointments = state.appointments.list_for_provider_account(account.id)?;
    Ok(Json(
        appointments.into_iter().map(AppointmentRes::from).collect(),
    ))
}

#[utoipa::path(
    put,
    path = "/api/doctor/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status updated", body = AppointmentActionRes),
        (status = 400, description = "Transition not admitted by the status machine"),
        (status = 404, description = "No such appointment on the caller's profile")
    )
)]
/// Update an appointment's status and attach clinical text.
///
/// Transitions follow the forward-only machine; a completed or cancelled
/// appointment cannot be reopened.
#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppState>,
    Extension(AuthedAccount(account)): Extension<AuthedAccount>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusReq>,
) -> ApiResult<Json<AppointmentActionRes>> {
    let update = StatusUpdate {
        status: parse_status(&req.status)?,
        diagnosis: req.diagnosis,
        prescription: req.prescription,
        notes: req.notes,
    };

    let appointment = state.appointments.update_status(account.id, id, update)?;
    Ok(Json(AppointmentActionRes {
        message: "Appointment updated successfully".into(),
        appointment: appointment.into(),
    }))
}
