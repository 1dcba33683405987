/// JWT Claims structure
///
/// Payload of an access token: the subject (the user's phone number) and
/// the registered time claims from RFC 7519.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (phone number of the user)
    pub sub: String,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
    /// Issued at (Unix timestamp, seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Claims {
    /// Create claims for `subject` valid for `ttl` starting at `now`
    ///
    /// `None` when the expiry falls outside the representable time range.
    pub fn new(subject: &str, ttl: Duration, now: DateTime<Utc>) -> Option<Self> {
        let expires_at = now.checked_add_signed(ttl)?;

        Some(Self {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
            iat: Some(now.timestamp()),
        })
    }

    /// A token is usable strictly before its expiry second; no leeway.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("+15551234567", Duration::minutes(30), t0())
            .expect("Expiry in range");

        assert_eq!(claims.sub, "+15551234567");
        assert_eq!(claims.iat, Some(t0().timestamp()));
        assert_eq!(claims.exp - t0().timestamp(), 30 * 60);
    }

    #[test]
    fn test_expiry_boundary_has_no_leeway() {
        let claims = Claims::new("+15551234567", Duration::minutes(30), t0())
            .expect("Expiry in range");

        assert!(!claims.is_expired_at(t0() + Duration::minutes(30) - Duration::seconds(1)));
        assert!(claims.is_expired_at(t0() + Duration::minutes(30)));
        assert!(claims.is_expired_at(t0() + Duration::minutes(31)));
    }

    #[test]
    fn test_wire_keys() {
        let claims = Claims::new("+15551234567", Duration::minutes(30), t0())
            .expect("Expiry in range");
        let json = serde_json::to_value(&claims).expect("Failed to serialize claims");

        assert_eq!(json["sub"], "+15551234567");
        assert_eq!(json["exp"], claims.exp);
    }

    #[test]
    fn test_unrepresentable_expiry_gives_none() {
        assert!(Claims::new("+15551234567", Duration::MAX, t0()).is_none());
        assert!(Claims::new("+15551234567", Duration::days(365), t0()).is_some());
    }

    #[test]
    fn test_claims_without_iat_deserialize() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "+15551234567",
            "exp": 1_700_000_000_i64
        }))
        .expect("Failed to deserialize claims");

        assert_eq!(claims.iat, None);
    }
}
