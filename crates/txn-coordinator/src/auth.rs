//! Bearer-credential verification for `POST /transfer` (spec §4.2 step 1,
//! §6). HS256 JWT, matching the teacher's own declared (if unused)
//! `jsonwebtoken` dependency in `bleep-auth`'s manifest.
//!
//! Only signature and standard `exp`/`iat` validation matter here — the
//! core spec is silent on claims beyond "valid bearer credential", so no
//! audience/issuer/subject checks are enforced.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use txn_core::TxnError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[allow(dead_code)]
    #[serde(default)]
    sub: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    exp: Option<usize>,
}

/// Verify an `Authorization: Bearer <token>` header value against `secret`.
pub fn verify_bearer(header: Option<&str>, secret: &str) -> Result<(), TxnError> {
    let header = header.ok_or(TxnError::Auth)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(TxnError::Auth)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    // The core spec does not define required claims; relax "required" spec
    // defaults so a minimal test token without `exp` still validates.
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|_| ())
        .map_err(|_| TxnError::Auth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                sub: Some("test-client".to_string()),
                exp: None,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_a_validly_signed_token() {
        let t = token("s3cr3t");
        let header = format!("Bearer {t}");
        assert!(verify_bearer(Some(&header), "s3cr3t").is_ok());
    }

    #[test]
    fn rejects_missing_header() {
        assert!(matches!(verify_bearer(None, "s3cr3t"), Err(TxnError::Auth)));
    }

    #[test]
    fn rejects_non_bearer_header() {
        assert!(matches!(
            verify_bearer(Some("Basic xyz"), "s3cr3t"),
            Err(TxnError::Auth)
        ));
    }

    #[test]
    fn rejects_wrong_secret() {
        let t = token("s3cr3t");
        let header = format!("Bearer {t}");
        assert!(matches!(
            verify_bearer(Some(&header), "other-secret"),
            Err(TxnError::Auth)
        ));
    }
}
