//! Unverified JWT claim inspection
//!
//! Only the expiry claim is read. Signatures are the API server's business;
//! the token cache is an optimisation, not a trust boundary.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::{GalasaError, Result};

/// A cached token must outlive `now` by more than this many minutes to be reused
pub const EXPIRY_BUFFER_MINUTES: i64 = 10;

#[derive(Debug, Deserialize)]
struct Claims {
    // NumericDate may carry a fractional part
    exp: Option<f64>,
}

/// Read the `exp` claim of a JWT
pub fn expiry(jwt: &str) -> Result<DateTime<Utc>> {
    let mut segments = jwt.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_header), Some(payload), Some(_signature), None) => payload,
        _ => return Err(GalasaError::Expiry("token is not a three-part JWT".to_string())),
    };

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| GalasaError::Expiry(format!("payload is not base64url: {e}")))?;

    let claims: Claims = serde_json::from_slice(&decoded)
        .map_err(|e| GalasaError::Expiry(format!("payload is not a JSON claims object: {e}")))?;

    let exp = claims
        .exp
        .ok_or_else(|| GalasaError::Expiry("token has no 'exp' claim".to_string()))?;

    let out_of_range = || GalasaError::Expiry(format!("'exp' claim {exp} is out of range"));
    if !exp.is_finite() {
        return Err(out_of_range());
    }
    DateTime::from_timestamp(exp.trunc() as i64, 0).ok_or_else(out_of_range)
}

/// True when the token expires strictly after `now` plus the expiry buffer
pub fn is_usable_at(jwt: &str, now: DateTime<Utc>) -> Result<bool> {
    Ok(expiry(jwt)? > now + Duration::minutes(EXPIRY_BUFFER_MINUTES))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an unsigned JWT with the given claims
    pub(crate) fn jwt_with_claims(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    pub(crate) fn jwt_expiring_at(exp: DateTime<Utc>) -> String {
        jwt_with_claims(&serde_json::json!({ "sub": "tester", "exp": exp.timestamp() }))
    }

    #[test]
    fn test_expiry_is_read_from_claims() {
        let exp = DateTime::from_timestamp(1_900_000_000, 0).unwrap();
        assert_eq!(expiry(&jwt_expiring_at(exp)).unwrap(), exp);
    }

    #[test]
    fn test_fractional_exp_is_truncated() {
        let jwt = jwt_with_claims(&serde_json::json!({ "sub": "tester", "exp": 1_900_000_000.75 }));
        let exp = DateTime::from_timestamp(1_900_000_000, 0).unwrap();
        assert_eq!(expiry(&jwt).unwrap(), exp);

        let now = exp - Duration::minutes(11);
        assert!(is_usable_at(&jwt, now).unwrap());
    }

    #[test]
    fn test_huge_exp_is_an_error() {
        let jwt = jwt_with_claims(&serde_json::json!({ "exp": 1e300 }));
        assert!(matches!(expiry(&jwt), Err(GalasaError::Expiry(_))));
    }

    #[test]
    fn test_expiry_buffer_boundaries() {
        let now = DateTime::from_timestamp(1_800_000_000, 0).unwrap();

        let nine = jwt_expiring_at(now + Duration::minutes(9));
        let ten = jwt_expiring_at(now + Duration::minutes(10));
        let eleven = jwt_expiring_at(now + Duration::minutes(11));
        let past = jwt_expiring_at(now - Duration::minutes(1));

        assert!(!is_usable_at(&nine, now).unwrap());
        assert!(!is_usable_at(&ten, now).unwrap());
        assert!(is_usable_at(&eleven, now).unwrap());
        assert!(!is_usable_at(&past, now).unwrap());
    }

    #[test]
    fn test_missing_exp_is_an_error() {
        let jwt = jwt_with_claims(&serde_json::json!({ "sub": "tester" }));
        assert!(matches!(expiry(&jwt), Err(GalasaError::Expiry(_))));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(matches!(expiry("not-a-jwt"), Err(GalasaError::Expiry(_))));
        assert!(matches!(expiry("a.!!!.c"), Err(GalasaError::Expiry(_))));
        assert!(matches!(expiry("a.b.c.d"), Err(GalasaError::Expiry(_))));

        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode("hello"));
        assert!(matches!(expiry(&not_json), Err(GalasaError::Expiry(_))));
    }
}
