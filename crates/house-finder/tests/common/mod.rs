#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use house_finder::config::{DatabaseConfig, ListingConfig};
use house_finder::db::connect_and_migrate;
use house_finder::listings::{
    Listing, ListingDraft, ListingId, ListingRepository, ListingService, NewListing,
    RepositoryError, SearchFilter, SqliteListingRepository,
};
use house_finder::users::{Registration, SqliteUserRepository, User, UserId, UserService};
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn memory_pool() -> SqlitePool {
    connect_and_migrate(&DatabaseConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// File-backed database removed on drop; unlike `memory_pool` it serves several connections.
pub struct TempDatabase {
    pub pool: SqlitePool,
    path: PathBuf,
}

impl TempDatabase {
    pub async fn create(max_connections: u32) -> Self {
        let path = std::env::temp_dir().join(format!("house-finder-{}.db", Uuid::new_v4()));
        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections,
        };
        let pool = connect_and_migrate(&config)
            .await
            .expect("file-backed database");
        Self { pool, path }
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn draft() -> ListingDraft {
    ListingDraft {
        price: 200_000.0,
        bedrooms: 3,
        year_built: 2015,
        garage_cars: 2,
        lot_area: 6000,
        overall_qual: 7,
        image_path: None,
        coordinates: None,
        duration_days: 7,
    }
}

pub fn listing_service(pool: &SqlitePool) -> ListingService<SqliteListingRepository> {
    ListingService::new(
        Arc::new(SqliteListingRepository::new(pool.clone())),
        ListingConfig::default(),
    )
}

pub fn user_service(pool: &SqlitePool) -> UserService<SqliteUserRepository> {
    UserService::new(Arc::new(SqliteUserRepository::new(pool.clone())))
}

pub async fn register(pool: &SqlitePool, username: &str) -> User {
    user_service(pool)
        .register(Registration {
            username: username.to_string(),
            password: "hunter22".to_string(),
            email: None,
        })
        .await
        .expect("registration succeeds")
}

/// Repository whose every call fails as if the database were gone.
pub struct UnavailableRepository;

fn unavailable() -> RepositoryError {
    RepositoryError::Unavailable("database is locked".to_string())
}

#[async_trait]
impl ListingRepository for UnavailableRepository {
    async fn insert(&self, _listing: NewListing) -> Result<Listing, RepositoryError> {
        Err(unavailable())
    }

    async fn fetch(&self, _id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        Err(unavailable())
    }

    async fn search(&self, _filter: &SearchFilter) -> Result<Vec<Listing>, RepositoryError> {
        Err(unavailable())
    }

    async fn increment_interest(&self, _id: ListingId) -> Result<u64, RepositoryError> {
        Err(unavailable())
    }

    async fn active_since(&self, _as_of: DateTime<Utc>) -> Result<Vec<Listing>, RepositoryError> {
        Err(unavailable())
    }

    async fn expiring_for_owner(
        &self,
        _owner: UserId,
        _now: DateTime<Utc>,
        _until: DateTime<Utc>,
    ) -> Result<Vec<Listing>, RepositoryError> {
        Err(unavailable())
    }
}

pub async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
