//! Admin handlers: directory oversight, deletions, and dashboard counts.
//!
//! Every route here sits behind the admin-only gate; handlers can assume
//! the caller is an authenticated admin.

use axum::extract::{Path, State};
use axum::response::Json;
use uuid::Uuid;

use crate::dto::{
    AccountRes, AppointmentRes, DoctorActionRes, DoctorRes, MessageRes, StatsRes,
};
use crate::error::ApiResult;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/admin/doctors",
    responses(
        (status = 200, description = "Every provider profile, approved or not", body = [DoctorRes])
    )
)]
/// List every provider profile, including unapproved ones.
#[axum::debug_handler]
pub async fn list_doctors(State(state): State<AppState>) -> ApiResult<Json<Vec<DoctorRes>>> {
    let doctors = state.providers.list(None, true)?;
    Ok(Json(doctors.into_iter().map(DoctorRes::from).collect()))
}

#[utoipa::path(
    put,
    path = "/api/admin/doctors/{id}/approve",
    params(("id" = String, Path, description = "Provider profile id")),
    responses(
        (status = 200, description = "Approval flag set", body = DoctorActionRes),
        (status = 404, description = "No such provider")
    )
)]
/// Approve a provider. Idempotent: re-approving is a no-op.
#[axum::debug_handler]
pub async fn approve_doctor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DoctorActionRes>> {
    let doctor = state.providers.approve(id)?;
    Ok(Json(DoctorActionRes {
        message: "Doctor approved successfully".into(),
        doctor: doctor.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/doctors/{id}",
    params(("id" = String, Path, description = "Provider profile id")),
    responses(
        (status = 200, description = "Provider, owning account and appointments removed", body = MessageRes),
        (status = 404, description = "No such provider")
    )
)]
/// Delete a provider.
///
/// Cascades as one compensated sequence: every appointment referencing the
/// provider, then the owning doctor account, then the profile itself. A
/// partial failure restores what was already deleted.
#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageRes>> {
    state.providers.delete(id)?;
    Ok(Json(MessageRes {
        message: "Doctor deleted successfully".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/patients",
    responses(
        (status = 200, description = "Every patient-role account", body = [AccountRes])
    )
)]
/// List every patient account.
#[axum::debug_handler]
pub async fn list_patients(State(state): State<AppState>) -> ApiResult<Json<Vec<AccountRes>>> {
    let patients = state.accounts.list_patients()?;
    Ok(Json(patients.into_iter().map(AccountRes::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/patients/{id}",
    params(("id" = String, Path, description = "Patient account id")),
    responses(
        (status = 200, description = "Patient account and their appointments removed", body = MessageRes),
        (status = 404, description = "No such patient")
    )
)]
/// Delete a patient account and their appointments.
#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageRes>> {
    state.accounts.delete_patient(id)?;
    Ok(Json(MessageRes {
        message: "Patient deleted successfully".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/appointments",
    responses(
        (status = 200, description = "The whole ledger, newest date first", body = [AppointmentRes])
    )
)]
/// List every appointment in the ledger.
#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<AppointmentRes>>> {
    let appointments = state.appointments.list_all()?;
    Ok(Json(
        appointments.into_iter().map(AppointmentRes::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Dashboard counters", body = StatsRes)
    )
)]
/// Dashboard counters, recounted from the collections on every call.
#[axum::debug_handler]
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsRes>> {
    Ok(Json(state.stats.dashboard()?.into()))
}
