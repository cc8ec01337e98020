use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};

use super::domain::{NewUser, StoredUser, User, UserId};
use super::repository::{RepositoryError, UserRepository};

#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
    email: Option<String>,
}

impl From<UserRow> for StoredUser {
    fn from(row: UserRow) -> Self {
        StoredUser {
            user: User {
                id: UserId(row.id),
                username: row.username,
                email: row.email,
            },
            password_hash: row.password,
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let result = sqlx::query("INSERT INTO users (username, password, email) VALUES (?, ?, ?)")
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.email.as_deref())
            .execute(&self.pool)
            .await?;

        Ok(User {
            id: UserId(result.last_insert_rowid()),
            username: user.username,
            email: user.email,
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, username, password, email FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(StoredUser::from))
    }

    async fn fetch(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, username, password, email FROM users WHERE id = ?")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|row| StoredUser::from(row).user))
    }
}
