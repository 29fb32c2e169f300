use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, UserId};

/// A user account.
///
/// `password_hash` is an opaque salted hash produced by whatever
/// [`crate::PasswordHasher`] the process is wired with; this crate never
/// inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: String,
    email: String,
    password_hash: String,
}

impl User {
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }

        let email = email.into();
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        Ok(Self {
            id,
            username: username.trim().to_string(),
            email,
            password_hash: password_hash.into(),
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_normalizes_fields() {
        let u = User::new(UserId::new(), "  alice ", " Alice@Example.COM ", "h").unwrap();
        assert_eq!(u.username(), "alice");
        assert_eq!(u.email(), "alice@example.com");
    }

    #[test]
    fn rejects_empty_username() {
        let err = User::new(UserId::new(), "  ", "a@example.com", "h").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_invalid_email() {
        let err = User::new(UserId::new(), "alice", "not-an-email", "h").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
