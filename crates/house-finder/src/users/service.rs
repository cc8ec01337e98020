use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{Credentials, NewUser, Registration, User, UserValidationError};
use super::password::{hash_password, verify_password};
use super::repository::{RepositoryError, UserRepository};

/// Registration and login on top of a `UserRepository`.
pub struct UserService<U> {
    repository: Arc<U>,
}

impl<U> UserService<U>
where
    U: UserRepository + 'static,
{
    pub fn new(repository: Arc<U>) -> Self {
        Self { repository }
    }

    pub async fn register(&self, registration: Registration) -> Result<User, UserServiceError> {
        let (username, email) = registration.validate()?;
        let new_user = NewUser {
            username,
            password_hash: hash_password(&registration.password),
            email,
        };

        match self.repository.insert(new_user).await {
            Ok(user) => {
                info!(user_id = user.id.0, username = %user.username, "user registered");
                Ok(user)
            }
            Err(RepositoryError::Conflict) => {
                warn!(username = %registration.username.trim(), "username already taken");
                Err(RepositoryError::Conflict.into())
            }
            Err(other) => Err(other.into()),
        }
    }

    pub async fn authenticate(&self, credentials: Credentials) -> Result<User, UserServiceError> {
        let username = credentials.username.trim();
        let Some(stored) = self.repository.find_by_username(username).await? else {
            return Err(UserServiceError::InvalidCredentials);
        };

        if !verify_password(&credentials.password, &stored.password_hash) {
            warn!(username = %username, "rejected login");
            return Err(UserServiceError::InvalidCredentials);
        }

        Ok(stored.user)
    }
}

/// Error raised by the user service.
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error(transparent)]
    Validation(#[from] UserValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("invalid username or password")]
    InvalidCredentials,
}
