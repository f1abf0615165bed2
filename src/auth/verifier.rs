//! Bearer credential verification.
//!
//! Turns the raw token from the `Authorization` header into a
//! [`VerifiedIdentity`], or an [`AuthError`] describing why it was refused.
//! Verification is a pure function of the token, the clock and the shared
//! secret; nothing is cached between requests.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

/// Audience every accepted credential must carry
pub const EXPECTED_AUDIENCE: &str = "authenticated";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No authentication token provided")]
    Missing,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token claims: {0}")]
    ClaimsInvalid(String),

    #[error("Could not validate token")]
    Invalid,

    #[error("Internal error while processing authentication")]
    Internal,
}

/// Identity established from a verified credential, scoped to one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedIdentity {
    /// The credential subject
    pub id: String,
    /// Every other decoded claim, passed through untouched
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl VerifiedIdentity {
    pub fn new(id: impl Into<String>, mut claims: Map<String, Value>) -> Self {
        // `id` is always the subject, never a claim of the same name
        claims.remove("id");
        Self { id: id.into(), claims }
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn email(&self) -> Option<&str> {
        self.claim("email").and_then(Value::as_str)
    }

    pub fn role(&self) -> Option<&str> {
        self.claim("role").and_then(Value::as_str)
    }

    /// The subject as a UUID, when the issuer uses UUID subjects
    pub fn user_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.id).ok()
    }
}

/// Registered claims every credential must carry once its signature checks out
#[derive(Debug, Deserialize)]
struct TokenPayload {
    sub: String,
    #[allow(dead_code)]
    aud: String,
    #[allow(dead_code)]
    exp: i64,
}

/// HS256 verifier built once at startup from the project JWT secret
pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl CredentialVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[EXPECTED_AUDIENCE]);
        validation.leeway = 0;
        validation.validate_exp = true;
        // Presence and shape of sub/aud/exp are checked against TokenPayload
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, raw_credential: Option<&str>) -> Result<VerifiedIdentity, AuthError> {
        let token = raw_credential.ok_or(AuthError::Missing)?;

        let decoded = decode::<Map<String, Value>>(token, &self.key, &self.validation)
            .map_err(|e| classify(e.kind()))?;
        let claims = decoded.claims;

        let payload: TokenPayload = serde_json::from_value(Value::Object(claims.clone()))
            .map_err(|e| {
                debug!("Token payload failed validation: {}", e);
                AuthError::Invalid
            })?;

        if payload.sub.is_empty() {
            debug!("Token payload carries an empty subject");
            return Err(AuthError::Invalid);
        }

        Ok(VerifiedIdentity::new(payload.sub, claims))
    }
}

/// Map a decoding failure onto the refusal taxonomy
fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::Expired,

        ErrorKind::InvalidAudience => AuthError::ClaimsInvalid("Invalid audience".to_string()),
        ErrorKind::InvalidIssuer => AuthError::ClaimsInvalid("Invalid issuer".to_string()),
        ErrorKind::InvalidSubject => AuthError::ClaimsInvalid("Invalid subject".to_string()),
        ErrorKind::ImmatureSignature => {
            AuthError::ClaimsInvalid("The token is not yet valid (nbf)".to_string())
        }
        ErrorKind::MissingRequiredClaim(claim) => {
            AuthError::ClaimsInvalid(format!("Missing required claim: {}", claim))
        }

        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => {
            debug!("Token rejected as malformed: {:?}", kind);
            AuthError::Invalid
        }

        other => {
            error!("Unexpected error while decoding token: {:?}", other);
            AuthError::Internal
        }
    }
}
