//! JWT access-token issuance and validation.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use tracing::debug;

use super::chain::TokenGate;
use super::{AuthConfig, AuthError, SigningSecret};
use crate::models::auth::{AccessToken, AuthorizedSubject, IssuedToken, TokenClaims, UserId};
use crate::store::CredentialStore;

/// Access token lifetime: 30 days.
pub const ACCESS_TOKEN_EXPIRY_DAYS: i64 = 30;

/// Algorithm used when signing.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Algorithms accepted on validation: the HMAC family only.
const ALLOWED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Signs access tokens bound to a user id.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: SigningSecret,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.signing_secret.clone(),
        }
    }

    /// Issue a token for `subject` expiring 30 days from now.
    pub fn issue(&self, subject: UserId) -> Result<IssuedToken, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, subject: UserId, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = (now + Duration::days(ACCESS_TOKEN_EXPIRY_DAYS)).timestamp();
        let claims = TokenClaims {
            sub: subject.to_string(),
            exp: expires_at,
            iat: now.timestamp(),
        };
        let token = encode(
            &Header::new(SIGNING_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::SigningError(format!("jwt encode: {e}")))?;
        Ok(IssuedToken { token, expires_at })
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

#[derive(Deserialize)]
struct RawClaims {
    sub: String,
    exp: i64,
}

fn decode_segment<T: serde::de::DeserializeOwned>(
    segment: &str,
    part: &str,
) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::MalformedToken(format!("{part} base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("{part} json: {e}")))
}

/// Parse header and claims without checking the signature, then reject any
/// algorithm outside [`ALLOWED_ALGORITHMS`].
fn parse_unverified(token: &str) -> Result<(Algorithm, AccessToken), AuthError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedToken("expected three segments".into()));
    };

    let raw_header: RawHeader = decode_segment(header, "header")?;
    let raw_claims: RawClaims = decode_segment(payload, "payload")?;
    let subject = raw_claims
        .sub
        .parse::<UserId>()
        .map_err(|_| AuthError::MalformedToken("subject is not a user id".into()))?;

    let alg = match raw_header.alg.parse::<Algorithm>() {
        Ok(alg) if ALLOWED_ALGORITHMS.contains(&alg) => alg,
        _ => return Err(AuthError::UnsupportedAlgorithm(raw_header.alg)),
    };

    Ok((
        alg,
        AccessToken {
            subject,
            expires_at: raw_claims.exp,
        },
    ))
}

/// Verifies access tokens and resolves their subject.
///
/// Gates run in a fixed order, each with its own error kind: parse,
/// algorithm, signature, expiry, subject lookup.
#[derive(Clone)]
pub struct TokenValidator {
    secret: SigningSecret,
    store: Arc<dyn CredentialStore>,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            secret: config.signing_secret.clone(),
            store,
        }
    }

    /// Parse the token and check its signature. Expiry is not checked here.
    fn verify(&self, token: &str) -> Result<AccessToken, AuthError> {
        let (alg, access) = parse_unverified(token)?;

        let mut validation = Validation::new(alg);
        validation.algorithms = ALLOWED_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidAlgorithm => AuthError::UnsupportedAlgorithm(format!("{alg:?}")),
            _ => AuthError::MalformedToken(e.to_string()),
        })?;

        Ok(access)
    }

    /// Validate a token against the current time.
    pub async fn validate(&self, token: &str) -> Result<AuthorizedSubject, AuthError> {
        self.validate_at(token, Utc::now()).await
    }

    /// Validate a token as if the current time were `now`.
    pub async fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthorizedSubject, AuthError> {
        let access = self.verify(token)?;

        if access.expires_at <= now.timestamp() {
            return Err(AuthError::TokenExpired);
        }

        let user = self
            .store
            .find_by_id(access.subject)
            .await?
            .ok_or(AuthError::SubjectNotFound)?;

        debug!(user_id = %user.id, "access token validated");
        Ok(AuthorizedSubject {
            user,
            expires_at: access.expires_at,
        })
    }
}

#[async_trait]
impl TokenGate for TokenValidator {
    async fn validate(&self, token: &str) -> Result<AuthorizedSubject, AuthError> {
        TokenValidator::validate(self, token).await
    }
}
