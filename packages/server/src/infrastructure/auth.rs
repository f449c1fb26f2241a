//! Bearer token verification (HS256 JWT).

use std::time::Duration;

use hubbub_shared::time::now_millis;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, IdentityVerifier, UserId};

/// Token claims.
///
/// `user_id` is accepted as an integer, a float with no fractional part (as
/// produced by issuers that treat every JSON number as a double) or a
/// numeric string.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: serde_json::Value,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
}

/// Verifies and mints HS256 tokens with a shared secret
pub struct JwtVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret),
            encoding: EncodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mint a token for `user_id` valid for `ttl`.
    pub fn issue(&self, user_id: &UserId, ttl: Duration) -> Result<String, AuthError> {
        let now = now_millis() / 1000;
        let numeric: u64 = user_id
            .as_str()
            .parse()
            .map_err(|_| AuthError::MissingUserId)?;
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| AuthError::Invalid(format!("token lifetime {ttl:?} out of range")))?;
        let claims = Claims {
            user_id: serde_json::Value::from(numeric),
            exp,
            iat: Some(now),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Invalid(e.to_string()))
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            }
        })?;
        user_id_from_claim(&data.claims.user_id)
    }
}

fn user_id_from_claim(value: &serde_json::Value) -> Result<UserId, AuthError> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(id) = n.as_u64() {
                return Ok(UserId::from(id));
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
                    Ok(UserId::from(f as u64))
                }
                _ => Err(AuthError::MissingUserId),
            }
        }
        serde_json::Value::String(s) => {
            UserId::new(s.clone()).map_err(|_| AuthError::MissingUserId)
        }
        _ => Err(AuthError::MissingUserId),
    }
}
