//! Signed, time-bounded access tokens.
//!
//! A token embeds identity, role and school scope; every request rebuilds
//! the caller's identity from the token alone (no server-side session).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{AppError, AppResult},
    models::UserRole,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub:       String,
    pub email:     String,
    pub role:      UserRole,
    pub school_id: Option<String>,
    pub iat:       i64,
    pub exp:       i64,
}

impl Claims {
    pub fn new(
        user_id: &str,
        email: &str,
        role: UserRole,
        school_id: Option<String>,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_owned(),
            email: email.to_owned(),
            role,
            school_id,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }
}

/// HS256 encoder/decoder pair built once at startup from the configured secret.
#[derive(Clone)]
pub struct Jwt {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation:   Validation,
    expiry:       Duration,
}

impl Jwt {
    pub fn new(secret: &[u8], expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation:   Validation::default(),
            expiry:       Duration::hours(expiry_hours),
        }
    }

    pub fn issue(
        &self,
        user_id: &str,
        email: &str,
        role: UserRole,
        school_id: Option<String>,
    ) -> AppResult<String> {
        let claims = Claims::new(user_id, email, role, school_id, self.expiry);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Token signing failed: {e}")))
    }

    /// Reject tampered or expired tokens before any role check runs.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> Jwt {
        Jwt::new(b"test-secret", 24)
    }

    #[test]
    fn issue_then_verify_roundtrip() {
        let token = jwt()
            .issue("u1", "d@x.com", UserRole::SchoolDirector, Some("school-a".into()))
            .unwrap();
        let claims = jwt().verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "d@x.com");
        assert_eq!(claims.role, UserRole::SchoolDirector);
        assert_eq!(claims.school_id.as_deref(), Some("school-a"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = jwt()
            .issue("u1", "d@x.com", UserRole::Teacher, None)
            .unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(matches!(jwt().verify(&tampered), Err(AppError::Unauthorized)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = jwt()
            .issue("u1", "d@x.com", UserRole::Teacher, None)
            .unwrap();
        let other = Jwt::new(b"other-secret", 24);
        assert!(matches!(other.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Expiry in the past; default Validation enforces exp.
        let expired = Jwt::new(b"test-secret", -1);
        let token = expired
            .issue("u1", "d@x.com", UserRole::Teacher, None)
            .unwrap();
        assert!(matches!(jwt().verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(jwt().verify("not-a-token").is_err());
    }
}
