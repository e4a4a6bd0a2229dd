//! Bearer-token issuance and verification.
//!
//! Tokens are compact HMAC-SHA256 credentials (`header.claims.signature`,
//! each part base64url) embedding the account id and an expiry. The
//! default expiry is 30 days. Verification checks structure, then the
//! signature, then the expiry, and never touches the store; resolving the
//! subject to a live account is the authorization gate's job.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

type HmacSha256 = Hmac<Sha256>;

/// Default credential lifetime, in days.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

/// Claims embedded in an issued token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// The account this credential was issued to.
    pub sub: Uuid,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

#[derive(Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Issues and verifies bearer tokens with a process-wide signing key.
#[derive(Clone)]
pub struct TokenService {
    key: Arc<Vec<u8>>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl AsRef<[u8]>, ttl_days: i64) -> Self {
        Self {
            key: Arc::new(secret.as_ref().to_vec()),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Signs a fresh token for the given account.
    pub fn issue(&self, account_id: Uuid) -> ApiResult<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: account_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let header = TokenHeader {
            alg: "HS256".into(),
            typ: "JWT".into(),
        };

        let header_json = serde_json::to_vec(&header).map_err(ApiError::internal)?;
        let claims_json = serde_json::to_vec(&claims).map_err(ApiError::internal)?;

        let message = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );

        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(ApiError::internal)?;
        mac.update(message.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{message}.{signature}"))
    }

    /// Verifies a presented token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns a 401 `ApiError` for a malformed token, a bad signature, or
    /// an expired credential.
    pub fn verify(&self, token: &str) -> ApiResult<TokenClaims> {
        let mut parts = token.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(ApiError::unauthenticated("Malformed token")),
            };

        let message = format!("{header_b64}.{claims_b64}");
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| ApiError::unauthenticated("Malformed token"))?;

        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(ApiError::internal)?;
        mac.update(message.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| ApiError::unauthenticated("Invalid token signature"))?;

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| ApiError::unauthenticated("Malformed token"))?;
        let claims: TokenClaims = serde_json::from_slice(&claims_json)
            .map_err(|_| ApiError::unauthenticated("Malformed token"))?;

        if claims.exp < Utc::now().timestamp() {
            return Err(ApiError::unauthenticated("Token has expired"));
        }

        Ok(claims)
    }
}
