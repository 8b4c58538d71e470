//! Credential hashing as an explicit value object: plaintext goes in at
//! construction, only the digest ever reaches storage. Registration and
//! login call these directly; nothing hashes implicitly on save.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Plaintext password wrapper so it cannot be logged by accident.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

#[derive(Debug, Clone)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn from_stored(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a password with Argon2id; the generated salt is embedded in the
/// digest string.
pub fn hash(password: &Password) -> Result<PasswordDigest, anyhow::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    let digest = argon2
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordDigest(digest))
}

/// Constant-time verification of a plaintext candidate against a digest.
pub fn verify(password: &Password, digest: &PasswordDigest) -> bool {
    let Ok(parsed) = PasswordHash::new(digest.as_str()) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed)
        .is_ok()
}
