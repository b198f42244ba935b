//! Password hashing via bcrypt.

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// bcrypt only reads the first 72 bytes of input.
const BCRYPT_MAX_INPUT: usize = 72;

/// Salted, adaptive-cost password hashing.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: BCRYPT_COST }
    }
}

impl PasswordHasher {
    /// Hasher with the production cost (10).
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher with an explicit cost. Tests use bcrypt's minimum (4).
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password. Inputs longer than 72 bytes are rejected rather than
    /// silently truncated.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.len() > BCRYPT_MAX_INPUT {
            return Err(AuthError::HashingError(format!(
                "password exceeds {BCRYPT_MAX_INPUT} bytes"
            )));
        }
        bcrypt::hash(password, self.cost)
            .map_err(|e| AuthError::HashingError(format!("bcrypt hash: {e}")))
    }

    /// Verify a password against a stored hash. A mismatch is `Ok(false)`;
    /// only a corrupted hash is an error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        if password.len() > BCRYPT_MAX_INPUT {
            return Ok(false);
        }
        bcrypt::verify(password, hash)
            .map_err(|e| AuthError::HashingError(format!("bcrypt verify: {e}")))
    }
}
