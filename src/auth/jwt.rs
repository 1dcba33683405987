/// JWT Token Issuance and Validation
///
/// Access tokens are self-contained HMAC-signed JWTs. Nothing is stored on
/// the server; the only shared state is the signing secret handed to
/// `TokenIssuer` at construction.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AuthError, ConfigError};

/// Longest configurable default lifetime for access tokens
pub const MAX_DEFAULT_TTL_DAYS: i64 = 365;

/// Signs and verifies access tokens with one process-wide secret
#[derive(Clone)]
pub struct TokenIssuer {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Build an issuer from a raw secret
    ///
    /// # Errors
    /// Rejects an empty secret, a non-HMAC algorithm and a TTL that is not
    /// positive or exceeds `MAX_DEFAULT_TTL_DAYS`.
    pub fn new(secret: &[u8], algorithm: Algorithm, default_ttl: Duration) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.algorithm {:?} is not an HMAC algorithm",
                algorithm
            )));
        }
        if default_ttl <= Duration::zero() {
            return Err(ConfigError::InvalidValue(
                "jwt.access_token_expiry must be positive".to_string(),
            ));
        }
        if default_ttl > Duration::days(MAX_DEFAULT_TTL_DAYS) {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.access_token_expiry must not exceed {} days",
                MAX_DEFAULT_TTL_DAYS
            )));
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            default_ttl,
        })
    }

    pub fn from_settings(settings: &JwtSettings) -> Result<Self, ConfigError> {
        let algorithm = Algorithm::from_str(&settings.algorithm).map_err(|_| {
            ConfigError::InvalidValue(format!("unknown jwt.algorithm {}", settings.algorithm))
        })?;

        let ttl = Duration::try_seconds(settings.access_token_expiry).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "jwt.access_token_expiry {} is out of range",
                settings.access_token_expiry
            ))
        })?;

        Self::new(settings.secret.as_bytes(), algorithm, ttl)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token for `subject` with the configured lifetime
    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        self.issue_at(subject, self.default_ttl, Utc::now())
    }

    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String, AuthError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    ///
    /// # Errors
    /// `Internal` if `now + ttl` is not a representable instant.
    pub fn issue_at(
        &self,
        subject: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims::new(subject, ttl, now)
            .ok_or_else(|| AuthError::Internal(format!("Token lifetime {} out of range", ttl)))?;

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify signature and expiry, returning the subject
    ///
    /// # Errors
    /// `InvalidCredentials` for any malformed, forged, expired or
    /// subject-less token.
    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate as if the current time were `now`
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against `now`, without leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "JWT rejected");
                AuthError::InvalidCredentials
            })?;

        if claims.is_expired_at(now) {
            tracing::debug!("JWT rejected: expired");
            return Err(AuthError::InvalidCredentials);
        }

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(claims.sub)
    }
}
