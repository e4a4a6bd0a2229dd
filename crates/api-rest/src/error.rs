//! HTTP error mapping.
//!
//! Handlers and middleware return [`ApiError`]; the `IntoResponse` impl
//! renders it as a JSON body with a human-readable message. The core
//! taxonomy maps onto 400 (validation/conflict), 401 (credential), 403
//! (role), 404 (entity) and 500. Unexpected failures are logged and
//! surfaced as a generic 500 without internal detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use medibook_core::ClinicError;

/// An error ready to be serialized to a caller.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    /// Logs the underlying failure and returns an opaque 500.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("internal error: {err}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Something went wrong".into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "message": self.message }));
        (self.status, body).into_response()
    }
}

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        match &err {
            ClinicError::Validation(_)
            | ClinicError::DuplicateEmail(_)
            | ClinicError::SlotTaken => Self::bad_request(err.to_string()),
            ClinicError::InvalidCredentials => Self::unauthenticated(err.to_string()),
            ClinicError::AccountNotFound
            | ClinicError::ProviderNotFound
            | ClinicError::AppointmentNotFound
            | ClinicError::ProviderUnavailable => Self::not_found(err.to_string()),
            ClinicError::StorageDirCreation(_)
            | ClinicError::StorageUnavailable { .. }
            | ClinicError::FileWrite(_)
            | ClinicError::FileRead(_)
            | ClinicError::Serialization(_)
            | ClinicError::Deserialization(_)
            | ClinicError::CascadeRollbackFailed { .. } => Self::internal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_class_maps_to_bad_request() {
        let err = ApiError::from(ClinicError::SlotTaken);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "time slot already booked");

        let err = ApiError::from(ClinicError::DuplicateEmail("a@x.com".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_entities_map_to_not_found() {
        for core_err in [
            ClinicError::AccountNotFound,
            ClinicError::ProviderNotFound,
            ClinicError::AppointmentNotFound,
            ClinicError::ProviderUnavailable,
        ] {
            assert_eq!(ApiError::from(core_err).status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn storage_failures_are_opaque_internal_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk fell out");
        let err = ApiError::from(ClinicError::FileWrite(io));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Something went wrong");
        assert!(!err.message().contains("disk"), "no internal detail leaks");
    }
}
