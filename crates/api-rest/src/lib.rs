//! # API REST
//!
//! REST surface for the medibook platform.
//!
//! Handles:
//! - HTTP endpoints with axum, grouped by role prefix
//! - the role-based authorization gate in front of each group
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON DTOs, CORS)
//!
//! Domain logic lives in `medibook-core`; this crate only parses requests,
//! runs the gate, and shapes responses.

#![warn(rust_2018_idioms)]

use std::sync::Arc;

use axum::extract::State;
use axum::middleware;
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use medibook_core::repositories::{
    AccountService, AppointmentService, ProviderService, StatsService,
};
use medibook_core::Store;

pub mod auth;
pub mod dto;
pub mod error;
pub mod guard;
pub mod routes;

pub use auth::{TokenService, DEFAULT_TOKEN_TTL_DAYS};
pub use error::{ApiError, ApiResult};

use dto::HealthRes;

/// Application state shared across REST API handlers.
///
/// Holds the repository services (all backed by one [`Store`] handle) and
/// the token service used by the authorization gate.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub providers: ProviderService,
    pub appointments: AppointmentService,
    pub stats: StatsService,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(store: Arc<Store>, tokens: TokenService) -> Self {
        Self {
            accounts: AccountService::new(store.clone()),
            providers: ProviderService::new(store.clone()),
            appointments: AppointmentService::new(store.clone()),
            stats: StatsService::new(store),
            tokens,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        routes::auth::register,
        routes::auth::login,
        routes::auth::me,
        routes::admin::list_doctors,
        routes::admin::approve_doctor,
        routes::admin::delete_doctor,
        routes::admin::list_patients,
        routes::admin::delete_patient,
        routes::admin::list_appointments,
        routes::admin::stats,
        routes::doctor::get_profile,
        routes::doctor::update_profile,
        routes::doctor::set_slots,
        routes::doctor::list_appointments,
        routes::doctor::update_appointment,
        routes::patient::list_doctors,
        routes::patient::get_doctor,
        routes::patient::book_appointment,
        routes::patient::my_appointments,
        routes::patient::cancel_appointment,
    ),
    components(schemas(
        dto::HealthRes,
        dto::RegisterReq,
        dto::LoginReq,
        dto::AuthRes,
        dto::MeRes,
        dto::AccountRes,
        dto::UpdateProfileReq,
        dto::SlotReq,
        dto::SetSlotsReq,
        dto::TimeSlotReq,
        dto::BookAppointmentReq,
        dto::UpdateStatusReq,
        dto::DoctorRes,
        dto::SlotRes,
        dto::DoctorActionRes,
        dto::TimeSlotRes,
        dto::AppointmentPatientRes,
        dto::AppointmentDoctorRes,
        dto::AppointmentRes,
        dto::AppointmentActionRes,
        dto::MessageRes,
        dto::StatsRes,
    ))
)]
struct ApiDoc;

/// Builds the full application router.
///
/// Routes are grouped by role prefix, each group behind one instance of
/// the authorization gate parameterized with that group's allowed roles.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .merge(
            Router::new()
                .route("/me", get(routes::auth::me))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    guard::any_account,
                )),
        );

    let admin_routes = Router::new()
        .route("/doctors", get(routes::admin::list_doctors))
        .route("/doctors/:id/approve", put(routes::admin::approve_doctor))
        .route("/doctors/:id", delete(routes::admin::delete_doctor))
        .route("/patients", get(routes::admin::list_patients))
        .route("/patients/:id", delete(routes::admin::delete_patient))
        .route("/appointments", get(routes::admin::list_appointments))
        .route("/stats", get(routes::admin::stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::admin_only,
        ));

    let doctor_routes = Router::new()
        .route(
            "/profile",
            get(routes::doctor::get_profile).put(routes::doctor::update_profile),
        )
        .route("/slots", put(routes::doctor::set_slots))
        .route("/appointments", get(routes::doctor::list_appointments))
        .route("/appointments/:id", put(routes::doctor::update_appointment))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::doctor_only,
        ));

    let patient_routes = Router::new()
        .route("/doctors", get(routes::patient::list_doctors))
        .route("/doctors/:id", get(routes::patient::get_doctor))
        .route(
            "/appointments",
            post(routes::patient::book_appointment).get(routes::patient::my_appointments),
        )
        .route(
            "/appointments/:id/cancel",
            put(routes::patient::cancel_appointment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::patient_only,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/doctor", doctor_routes)
        .nest("/api/patient", patient_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "medibook REST API is alive".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use medibook_core::{CoreConfig, RetryPolicy};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(tmp: &TempDir) -> AppState {
        let cfg = Arc::new(CoreConfig::new(tmp.path().to_path_buf()));
        let store =
            Arc::new(Store::open(cfg, RetryPolicy::default()).expect("open should succeed"));
        AppState::new(store, TokenService::new(b"test-secret", 30))
    }

    async fn call(
        state: &AppState,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .expect("request should build"),
            None => builder.body(Body::empty()).expect("request should build"),
        };

        let response = router(state.clone())
            .oneshot(request)
            .await
            .expect("request should not fail at the transport level");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register(state: &AppState, name: &str, email: &str, role: &str) -> (String, Value) {
        let (status, body) = call(
            state,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": name,
                "email": email,
                "password": "password123",
                "role": role,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let token = body["token"].as_str().expect("token present").to_owned();
        (token, body["user"].clone())
    }

    #[tokio::test]
    async fn health_endpoint_is_open() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);

        let (status, body) = call(&state, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn gate_returns_401_without_credential_and_403_for_wrong_role() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);

        let (status, _) = call(&state, Method::GET, "/api/admin/stats", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (patient_token, _) = register(&state, "Pat", "pat@x.com", "patient").await;
        let (status, _) = call(
            &state,
            Method::GET,
            "/api/admin/stats",
            Some(&patient_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (admin_token, _) = register(&state, "Adm", "admin@x.com", "admin").await;
        let (status, body) = call(
            &state,
            Method::GET,
            "/api/admin/stats",
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_patients"], 1);
    }

    #[tokio::test]
    async fn gate_rejects_credentials_of_deleted_accounts() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);

        let (admin_token, _) = register(&state, "Adm", "admin@x.com", "admin").await;
        let (patient_token, patient) = register(&state, "Pat", "pat@x.com", "patient").await;
        let patient_id = patient["id"].as_str().unwrap().to_owned();

        let (status, _) = call(
            &state,
            Method::DELETE,
            &format!("/api/admin/patients/{patient_id}"),
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // The deleted patient's still-valid token no longer authenticates.
        let (status, _) = call(
            &state,
            Method::GET,
            "/api/auth/me",
            Some(&patient_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);

        register(&state, "Pat", "a@x.com", "patient").await;
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Imposter",
                "email": "a@x.com",
                "password": "password123",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("already exists"));
    }

    /// The end-to-end booking scenario: registration, approval,
    /// availability, a booking, a conflicting booking, a cancellation, and
    /// a successful rebooking of the freed slot.
    #[tokio::test]
    async fn full_booking_scenario() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);

        let (patient_token, _) = register(&state, "Pat A", "a@x.com", "patient").await;
        let (second_token, _) = register(&state, "Pat B", "b@x.com", "patient").await;
        let (doctor_token, _) = register(&state, "Dr C", "doc@x.com", "doctor").await;
        let (admin_token, _) = register(&state, "Adm", "admin@x.com", "admin").await;

        // The unapproved doctor is invisible to patients.
        let (status, body) = call(
            &state,
            Method::GET,
            "/api/patient/doctors",
            Some(&patient_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 0);

        // Doctor fills in their profile and availability.
        let (status, _) = call(
            &state,
            Method::PUT,
            "/api/doctor/profile",
            Some(&doctor_token),
            Some(json!({
                "specialization": "Cardiology",
                "experience_years": 12,
                "qualifications": "MBBS, MD",
                "consultation_fee": 500.0,
                "bio": "Consultant cardiologist",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &state,
            Method::PUT,
            "/api/doctor/slots",
            Some(&doctor_token),
            Some(json!({
                "available_slots": [
                    {"day": "Monday", "start_time": "09:00", "end_time": "10:00"},
                ],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Admin approves the doctor.
        let (status, body) = call(
            &state,
            Method::GET,
            "/api/admin/doctors",
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let doctor_id = body[0]["id"].as_str().unwrap().to_owned();

        let (status, _) = call(
            &state,
            Method::PUT,
            &format!("/api/admin/doctors/{doctor_id}/approve"),
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Now the doctor is listed and bookable.
        let (status, body) = call(
            &state,
            Method::GET,
            "/api/patient/doctors?specialization=Cardiology",
            Some(&patient_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let booking = json!({
            "doctor_id": doctor_id,
            "appointment_date": "2026-09-07",
            "time_slot": {"start_time": "09:00", "end_time": "10:00"},
            "symptoms": "chest pain on exertion",
        });

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/patient/appointments",
            Some(&patient_token),
            Some(booking.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "booking failed: {body}");
        let appointment_id = body["appointment"]["id"].as_str().unwrap().to_owned();
        assert_eq!(body["appointment"]["consultation_fee"], 500.0);

        // The identical slot conflicts for a second patient.
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/patient/appointments",
            Some(&second_token),
            Some(booking.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("already booked"));

        // The first patient cancels, freeing the slot.
        let (status, body) = call(
            &state,
            Method::PUT,
            &format!("/api/patient/appointments/{appointment_id}/cancel"),
            Some(&patient_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appointment"]["status"], "cancelled");

        // The second patient can now take the same slot.
        let (status, _) = call(
            &state,
            Method::POST,
            "/api/patient/appointments",
            Some(&second_token),
            Some(booking),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // Doctor sees the surviving booking and confirms it.
        let (status, body) = call(
            &state,
            Method::GET,
            "/api/doctor/appointments",
            Some(&doctor_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let schedule = body.as_array().unwrap();
        assert_eq!(schedule.len(), 2);
        let live = schedule
            .iter()
            .find(|a| a["status"] == "pending")
            .expect("one live booking");
        let live_id = live["id"].as_str().unwrap();

        let (status, body) = call(
            &state,
            Method::PUT,
            &format!("/api/doctor/appointments/{live_id}"),
            Some(&doctor_token),
            Some(json!({"status": "confirmed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appointment"]["status"], "confirmed");

        // Dashboard counts line up with what just happened.
        let (status, body) = call(
            &state,
            Method::GET,
            "/api/admin/stats",
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_doctors"], 1);
        assert_eq!(body["total_patients"], 2);
        assert_eq!(body["total_appointments"], 2);
        assert_eq!(body["pending_appointments"], 0);
    }
}
