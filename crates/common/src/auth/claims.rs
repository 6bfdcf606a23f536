//! Access token claims
//!
//! Decodes the payload segment of a JWT-shaped access token to read the
//! subject and expiry claims. The signature is never verified here: the
//! claims only drive the early-renewal heuristic, and the backend remains
//! the authority on whether a token is actually valid.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::error::AuthError;
use crate::time::Clock;

/// Claims read from the payload segment of an access token
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject identifier (usually the user id or email)
    #[serde(default)]
    pub sub: Option<String>,

    /// Expiry as seconds since the UNIX epoch
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decode claims from a JWT-shaped token string
    ///
    /// Splits the token on `.`, base64url-decodes the payload segment and
    /// parses it as JSON. Unknown claims are ignored.
    ///
    /// # Errors
    /// Returns `AuthError::Decode` if the token does not have a payload
    /// segment, the segment is not valid base64url, or the payload is not
    /// valid JSON.
    pub fn decode(token: &str) -> Result<Self, AuthError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next()) {
            (Some(_header), Some(payload)) if !payload.is_empty() => payload,
            _ => return Err(AuthError::Decode("token has no payload segment".to_string())),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| AuthError::Decode(format!("payload is not valid base64url: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::Decode(format!("payload is not valid JSON: {e}")))
    }

    /// Expiry as a wall-clock timestamp
    ///
    /// Returns `None` when the token carries no `exp` claim or the claim is
    /// out of range.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Check whether the token expires within the given threshold
    ///
    /// Tokens without an `exp` claim never report as expiring; they are
    /// renewed only when the backend rejects them.
    #[must_use]
    pub fn expires_within(&self, threshold_seconds: i64, clock: &dyn Clock) -> bool {
        match self.expires_at() {
            Some(expires_at) => {
                let now: DateTime<Utc> = clock.system_time().into();
                expires_at - now <= Duration::seconds(threshold_seconds)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::claims.
    use std::time::Duration as StdDuration;

    use super::*;
    use crate::testing::MockClock;

    /// Build a JWT-shaped token with the given JSON payload.
    fn token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        format!("{header}.{body}.signature")
    }

    /// Validates `TokenClaims::decode` behavior for the well-formed token
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `claims.sub` equals `Some("user-42".to_string())`.
    /// - Confirms `claims.exp` equals `Some(1_700_000_000)`.
    #[test]
    fn test_decode_well_formed_token() {
        let token = token_with_payload(r#"{"sub":"user-42","exp":1700000000}"#);
        let claims = TokenClaims::decode(&token).unwrap();

        assert_eq!(claims.sub, Some("user-42".to_string()));
        assert_eq!(claims.exp, Some(1_700_000_000));
    }

    /// Validates `TokenClaims::decode` behavior for the unknown claims
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures extra claims are ignored without error.
    #[test]
    fn test_decode_ignores_unknown_claims() {
        let token = token_with_payload(r#"{"sub":"user","exp":100,"aud":"dashboard","iat":1}"#);
        let claims = TokenClaims::decode(&token).unwrap();
        assert_eq!(claims.sub, Some("user".to_string()));
    }

    /// Validates `TokenClaims::decode` behavior for the missing claims
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `claims.sub` equals `None`.
    /// - Confirms `claims.exp` equals `None`.
    #[test]
    fn test_decode_tolerates_missing_claims() {
        let token = token_with_payload("{}");
        let claims = TokenClaims::decode(&token).unwrap();

        assert_eq!(claims.sub, None);
        assert_eq!(claims.exp, None);
    }

    /// Validates `TokenClaims::decode` behavior for malformed input.
    ///
    /// Assertions:
    /// - Ensures a token without segments fails with `AuthError::Decode`.
    /// - Ensures a non-base64 payload fails with `AuthError::Decode`.
    /// - Ensures a non-JSON payload fails with `AuthError::Decode`.
    #[test]
    fn test_decode_rejects_malformed_tokens() {
        assert!(matches!(TokenClaims::decode("opaque"), Err(AuthError::Decode(_))));
        assert!(matches!(TokenClaims::decode("header.%%%.sig"), Err(AuthError::Decode(_))));

        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode(b"not json"));
        assert!(matches!(TokenClaims::decode(&not_json), Err(AuthError::Decode(_))));
    }

    /// Validates `TokenClaims::expires_within` behavior around the renewal
    /// threshold.
    ///
    /// Assertions:
    /// - Ensures a token expiring beyond the threshold does not report as
    ///   expiring.
    /// - Ensures the same token reports as expiring after the clock advances
    ///   into the threshold window.
    /// - Ensures an already-expired token reports as expiring.
    #[test]
    fn test_expires_within_threshold() {
        let clock = MockClock::new();
        let now = clock.seconds_since_epoch() as i64;
        let claims = TokenClaims { sub: None, exp: Some(now + 120) };

        assert!(!claims.expires_within(30, &clock));

        clock.advance(StdDuration::from_secs(100));
        assert!(claims.expires_within(30, &clock));

        clock.advance(StdDuration::from_secs(3600));
        assert!(claims.expires_within(30, &clock));
    }

    /// Validates `TokenClaims::expires_within` behavior for tokens without an
    /// expiry claim.
    ///
    /// Assertions:
    /// - Ensures `!claims.expires_within(30, &clock)` evaluates to true.
    #[test]
    fn test_no_expiry_never_reports_expiring() {
        let clock = MockClock::new();
        let claims = TokenClaims::default();
        assert!(!claims.expires_within(30, &clock));
    }
}
