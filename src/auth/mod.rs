pub mod jwt;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};

use crate::errors::{AppError, AppResult};

// ── Password helpers ──────────────────────────────────────────

/// Build an Argon2id hasher with the configured time cost. Memory and
/// parallelism stay at the library defaults.
fn hasher(time_cost: u32) -> AppResult<Argon2<'static>> {
    let params = Params::new(
        Params::DEFAULT_M_COST,
        time_cost.max(1),
        Params::DEFAULT_P_COST,
        None,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid hash params: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn hash_password(password: &str, time_cost: u32) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher(time_cost)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash. The hash string carries its own
/// parameters, so verification works regardless of the configured cost.
pub fn verify_password(password: &str, hash: &str) -> AppResult<()> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid hash: {e}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthorized)
}

pub fn validate_password_strength(password: &str) -> AppResult<()> {
    if password.len() < 8 {
        return Err(AppError::BadRequest("Password must be at least 8 characters".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("secret123", 1).unwrap();
        assert!(verify_password("secret123", &hash).is_ok());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let hash = hash_password("secret123", 1).unwrap();
        assert!(matches!(
            verify_password("secret124", &hash),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn hash_is_not_plaintext_and_is_salted() {
        let a = hash_password("secret123", 1).unwrap();
        let b = hash_password("secret123", 1).unwrap();
        assert!(!a.contains("secret123"));
        assert_ne!(a, b);
    }

    #[test]
    fn short_passwords_fail_validation() {
        assert!(validate_password_strength("short").is_err());
        assert!(validate_password_strength("long enough").is_ok());
    }
}
