//! HS256 access tokens
//!
//! Tokens carry the user id (`sub`), the owning company (`tenant_id`) and the role.
//! Tenant resolution trusts the `tenant_id` claim of a verified token without a
//! registry round-trip, so the signing secret is the trust boundary.

use chrono::{Duration, Utc};
use hirebase_core::models::UserRole;
use hirebase_core::AppError;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Clock skew tolerated on `exp` and `nbf`, in seconds.
const LEEWAY_SECS: u64 = 30;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtClaims {
    pub sub: Uuid, // user_id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Uuid>,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl JwtClaims {
    /// Parsed role; unknown roles are rejected like any other invalid token.
    pub fn user_role(&self) -> Result<UserRole, AppError> {
        self.role
            .parse()
            .map_err(|e: String| AppError::Unauthorized(e))
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = LEEWAY_SECS;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl: Duration::hours(expiry_hours),
        }
    }

    /// Lifetime applied when callers do not pass their own.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign a token for `subject_id`, optionally bound to a company.
    pub fn issue(
        &self,
        subject_id: Uuid,
        tenant_id: Option<Uuid>,
        role: UserRole,
        ttl: Option<Duration>,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: subject_id,
            tenant_id,
            role: role.to_string(),
            exp: (now + ttl.unwrap_or(self.default_ttl)).timestamp(),
            iat: now.timestamp(),
            nbf: Some(now.timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature, expiry and not-before, and return the claims.
    pub fn decode(&self, token: &str) -> Result<JwtClaims, AppError> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                ErrorKind::ImmatureSignature => {
                    AppError::Unauthorized("Token is not yet valid".to_string())
                }
                _ => AppError::Unauthorized(format!("Invalid token: {}", e)),
            })
    }
}
