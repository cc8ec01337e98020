use serde::{Deserialize, Serialize};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;
pub const PASSWORD_MIN_LEN: usize = 6;

/// Store-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Public view of an account; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
}

/// Sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Registration {
    /// Returns the normalized username and email, leaving the password untouched.
    pub(crate) fn validate(&self) -> Result<(String, Option<String>), UserValidationError> {
        let username = self.username.trim();
        let length = username.chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&length)
            || username.chars().any(char::is_whitespace)
        {
            return Err(UserValidationError::Username);
        }

        if self.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(UserValidationError::Password);
        }

        let email = self
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty());
        if let Some(email) = email {
            if !email.contains('@') {
                return Err(UserValidationError::Email(email.to_string()));
            }
        }

        Ok((username.to_string(), email.map(str::to_string)))
    }
}

/// Login form.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Row handed to the repository on registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
}

/// Account plus its stored hash, only used while authenticating.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("username must be 3-32 characters without spaces")]
    Username,
    #[error("password must be at least 6 characters")]
    Password,
    #[error("'{0}' is not an email address")]
    Email(String),
}
