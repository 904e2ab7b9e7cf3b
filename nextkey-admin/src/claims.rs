//! Access-token claims and HS256 signing.

use crate::error::{AdminError, AdminResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims carried by an administrator access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub admin_id: i64,
    pub username: String,
    /// Unique id of this token; the handle used to revoke it.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from one shared secret.
pub(crate) struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub(crate) fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        // Expiry is checked against the injected clock by the caller.
        validation.validate_exp = false;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub(crate) fn sign(&self, claims: &AccessClaims) -> AdminResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AdminError::Signing(e.to_string()))
    }

    /// Verifies the signature and algorithm; does not check expiry.
    pub(crate) fn verify(&self, token: &str) -> AdminResult<AccessClaims> {
        decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AdminError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> AccessClaims {
        AccessClaims {
            admin_id: 7,
            username: "root".into(),
            jti: "jti-1".into(),
            iat: 100,
            exp: 1_000,
        }
    }

    #[test]
    fn sign_then_verify() {
        let keys = JwtKeys::new(b"secret");
        let token = keys.sign(&claims()).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), claims());
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = JwtKeys::new(b"secret").sign(&claims()).unwrap();
        assert!(matches!(
            JwtKeys::new(b"other").verify(&token),
            Err(AdminError::InvalidToken(_))
        ));
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims(),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(JwtKeys::new(b"secret").verify(&token).is_err());
    }

    #[test]
    fn missing_exp_is_rejected() {
        #[derive(Serialize)]
        struct NoExp {
            admin_id: i64,
            username: String,
            jti: String,
            iat: i64,
        }
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoExp {
                admin_id: 1,
                username: "root".into(),
                jti: "j".into(),
                iat: 0,
            },
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(JwtKeys::new(b"secret").verify(&token).is_err());
    }
}
