//! Registration, login, and the current-account endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;

use medibook_core::repositories::RegisterInput;
use medibook_core::{EmailAddress, NonEmptyText, Role};

use crate::dto::{parse_role, AccountRes, AuthRes, LoginReq, MeRes, RegisterReq};
use crate::error::{ApiError, ApiResult};
use crate::guard::AuthedAccount;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created", body = AuthRes),
        (status = 400, description = "Validation failure or duplicate email")
    )
)]
/// Register a new account.
///
/// The role defaults to `patient`. Registering as a doctor also creates an
/// unapproved placeholder provider profile, so the doctor can log in and
/// fill in their details before an admin approves them.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - a required field is missing or unacceptable, or
/// - an account already exists for the email address.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterReq>,
) -> ApiResult<(StatusCode, Json<AuthRes>)> {
    let name = NonEmptyText::new(&req.name)
        .map_err(|_| ApiError::bad_request("name must not be empty"))?;
    let email =
        EmailAddress::parse(&req.email).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let role = match req.role.as_deref() {
        Some(raw) => parse_role(raw)?,
        None => Role::Patient,
    };

    let account = state.accounts.register(RegisterInput {
        name,
        email,
        password: req.password,
        phone: req.phone.unwrap_or_default(),
        role,
    })?;

    let token = state.tokens.issue(account.id)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthRes {
            success: true,
            token,
            user: AccountRes::from(account.view()),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Credential accepted", body = AuthRes),
        (status = 401, description = "Invalid credentials")
    )
)]
/// Exchange an email/password pair for a bearer token.
///
/// Unknown addresses and wrong passwords return the same 401 so callers
/// cannot probe which addresses are registered.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> ApiResult<Json<AuthRes>> {
    let account = state.accounts.login(&req.email, &req.password)?;
    let token = state.tokens.issue(account.id)?;

    Ok(Json(AuthRes {
        success: true,
        token,
        user: AccountRes::from(account.view()),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The authenticated account", body = MeRes),
        (status = 401, description = "Missing or invalid credential")
    )
)]
/// The account behind the presented credential.
#[axum::debug_handler]
pub async fn me(Extension(AuthedAccount(account)): Extension<AuthedAccount>) -> Json<MeRes> {
    Json(MeRes {
        success: true,
        user: AccountRes::from(account.view()),
    })
}
