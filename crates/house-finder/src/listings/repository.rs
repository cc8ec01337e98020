use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{Listing, ListingId, NewListing, SearchFilter};
pub use crate::db::RepositoryError;
use crate::users::UserId;

/// Storage abstraction so the service and notifier can be exercised in isolation.
///
/// Every write is a single statement; a failed call leaves storage unchanged.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn insert(&self, listing: NewListing) -> Result<Listing, RepositoryError>;
    async fn fetch(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError>;
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Listing>, RepositoryError>;
    /// Adds exactly one to the counter and returns the new value; `NotFound` for unknown ids.
    async fn increment_interest(&self, id: ListingId) -> Result<u64, RepositoryError>;
    async fn active_since(&self, as_of: DateTime<Utc>) -> Result<Vec<Listing>, RepositoryError>;
    /// Listings owned by `owner` expiring in `(now, until]`.
    async fn expiring_for_owner(
        &self,
        owner: UserId,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Listing>, RepositoryError>;
}
