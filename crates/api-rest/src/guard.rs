//! The role-based authorization gate.
//!
//! One gate, parameterized by an allowed-role set, sits in front of every
//! protected route group via `middleware::from_fn_with_state`. It extracts
//! the bearer credential, verifies it, resolves the subject to a live
//! account, and checks the account's role against the allowed set. The
//! resolved [`AuthedAccount`] is attached to the request's extensions for
//! handlers to read.
//!
//! Failures are terminal per-request: a missing/invalid/expired credential
//! and a credential whose account no longer exists are 401; a live account
//! with the wrong role is 403.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use medibook_core::{Account, ClinicError, Role};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// The authenticated caller, attached to request extensions by the gate.
#[derive(Clone)]
pub struct AuthedAccount(pub Account);

fn extract_bearer_token(headers: &HeaderMap) -> ApiResult<String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthenticated("Missing Authorization header"))?
        .to_str()
        .map_err(|_| ApiError::unauthenticated("Invalid Authorization header format"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_owned)
        .ok_or_else(|| ApiError::unauthenticated("Authorization header must use Bearer scheme"))
}

async fn gate(
    state: AppState,
    mut req: Request,
    next: Next,
    allowed: &'static [Role],
) -> ApiResult<Response> {
    let token = extract_bearer_token(req.headers())?;
    let claims = state.tokens.verify(&token)?;

    // The subject id is part of the credential, so a deleted account makes
    // the credential itself invalid: 401, not 404.
    let account = match state.accounts.get(claims.sub) {
        Ok(account) => account,
        Err(ClinicError::AccountNotFound) => {
            return Err(ApiError::unauthenticated("Account no longer exists"));
        }
        Err(other) => return Err(other.into()),
    };

    if !allowed.contains(&account.role) {
        return Err(ApiError::forbidden(format!(
            "Access denied for role {}",
            account.role
        )));
    }

    req.extensions_mut().insert(AuthedAccount(account));
    Ok(next.run(req).await)
}

pub async fn admin_only(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    gate(state, req, next, &[Role::Admin]).await
}

pub async fn doctor_only(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    gate(state, req, next, &[Role::Doctor]).await
}

pub async fn patient_only(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    gate(state, req, next, &[Role::Patient]).await
}

/// Any authenticated account, used by `/api/auth/me`.
pub async fn any_account(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    gate(state, req, next, &[Role::Patient, Role::Doctor, Role::Admin]).await
}
