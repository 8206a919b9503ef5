//! Token decoding
//!
//! Tokens are JWT-shaped (`header.payload.signature`). Only the payload is
//! read, and only for its `exp` claim. The signature is never checked: this
//! tells us whether a token is fresh, not whether it is authentic.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::AuthError;

/// Claims we care about from the token payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TokenPayload {
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl TokenPayload {
    /// Expired once `now` reaches `exp`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// `None` if `exp` is outside chrono's representable range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Decode the payload segment of `token`.
pub fn decode(token: &str) -> Result<TokenPayload, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::MalformedToken(format!(
            "expected 3 segments, found {}",
            parts.len()
        )));
    }
    if parts.iter().any(|p| p.is_empty()) {
        return Err(AuthError::MalformedToken("empty segment".to_string()));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| AuthError::MalformedToken(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("invalid payload: {}", e)))
}

#[cfg(test)]
pub(crate) fn encode_for_test(payload: &str) -> String {
    format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(payload)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_exp(exp: i64) -> String {
        encode_for_test(&format!(r#"{{"exp":{},"sub":"octocat"}}"#, exp))
    }

    fn assert_malformed(token: &str) {
        match decode(token) {
            Err(AuthError::MalformedToken(_)) => {}
            other => panic!("expected MalformedToken for {:?}, got {:?}", token, other),
        }
    }

    #[test]
    fn test_decode_expiry() {
        let payload = decode(&token_with_exp(1_900_000_000)).unwrap();
        assert_eq!(payload.exp, 1_900_000_000);
    }

    #[test]
    fn test_decode_ignores_extra_claims() {
        let token = encode_for_test(r#"{"iat":1,"exp":42,"roles":["admin"]}"#);
        assert_eq!(decode(&token).unwrap(), TokenPayload { exp: 42 });
    }

    #[test]
    fn test_wrong_segment_count() {
        assert_malformed("");
        assert_malformed("abc");
        assert_malformed("a.b");
        assert_malformed("a.b.c.d");
    }

    #[test]
    fn test_empty_segments() {
        let valid = token_with_exp(10);
        let parts: Vec<&str> = valid.split('.').collect();
        assert_malformed(&format!(".{}.{}", parts[1], parts[2]));
        assert_malformed(&format!("{}.{}.", parts[0], parts[1]));
        assert_malformed(&format!("{}..{}", parts[0], parts[2]));
    }

    #[test]
    fn test_payload_not_base64url() {
        assert_malformed("head.!!!not-base64!!!.sig");
        // Padded input is rejected; the payload must be unpadded.
        let padded = format!("head.{}==.sig", URL_SAFE_NO_PAD.encode(r#"{"exp":1}"#));
        assert_malformed(&padded);
    }

    #[test]
    fn test_payload_not_json_or_missing_exp() {
        assert_malformed(&encode_for_test("plain text"));
        assert_malformed(&encode_for_test(r#"{"sub":"octocat"}"#));
        assert_malformed(&encode_for_test(r#"{"exp":"tomorrow"}"#));
        assert_malformed(&encode_for_test("42"));
        assert_malformed(&encode_for_test("null"));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let token = token_with_exp(123);
        assert_eq!(decode(&token).unwrap(), decode(&token).unwrap());
    }

    #[test]
    fn test_expiry_boundary() {
        let payload = TokenPayload { exp: 100 };
        assert!(!payload.is_expired_at(99));
        assert!(payload.is_expired_at(100));
        assert!(payload.is_expired_at(101));
    }

    #[test]
    fn test_expires_at() {
        let payload = TokenPayload { exp: 0 };
        assert_eq!(payload.expires_at().unwrap().timestamp(), 0);
        assert!(TokenPayload { exp: i64::MAX }.expires_at().is_none());
    }
}
