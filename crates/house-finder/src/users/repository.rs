use async_trait::async_trait;

use super::domain::{NewUser, StoredUser, User, UserId};
pub use crate::db::RepositoryError;

/// Credential storage; usernames are unique and a duplicate insert reports `Conflict`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, RepositoryError>;
    async fn fetch(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
}
