//! Credential verification seam.
//!
//! The hashing algorithm (salting, work factor) is intentionally outside this
//! crate: the process wires in a [`PasswordHasher`] and the domain only ever
//! sees opaque hashes.

use stockbook_core::DomainError;

use crate::user::User;

/// Salted password hashing boundary.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password (salting is the implementation's concern).
    fn hash(&self, password: &str) -> String;

    /// Verify a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Check a plaintext password against a user's stored hash.
pub fn verify_password(
    user: &User,
    password: &str,
    hasher: &dyn PasswordHasher,
) -> Result<(), DomainError> {
    if hasher.verify(password, user.password_hash()) {
        Ok(())
    } else {
        Err(DomainError::validation("invalid credentials"))
    }
}

#[cfg(test)]
mod tests {
    use stockbook_core::UserId;

    use super::*;

    /// Test-only hasher: reversible tagging, no security properties.
    struct TaggingHasher;

    impl PasswordHasher for TaggingHasher {
        fn hash(&self, password: &str) -> String {
            format!("tag${password}")
        }

        fn verify(&self, password: &str, hash: &str) -> bool {
            hash == format!("tag${password}")
        }
    }

    #[test]
    fn verify_accepts_matching_password() {
        let hasher = TaggingHasher;
        let user = User::new(UserId::new(), "alice", "a@example.com", hasher.hash("s3cret"))
            .unwrap();
        assert!(verify_password(&user, "s3cret", &hasher).is_ok());
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hasher = TaggingHasher;
        let user = User::new(UserId::new(), "alice", "a@example.com", hasher.hash("s3cret"))
            .unwrap();
        let err = verify_password(&user, "wrong", &hasher).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
