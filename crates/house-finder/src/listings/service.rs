use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::domain::{
    AnnouncementView, InterestReceipt, Listing, ListingDraft, ListingId, ListingValidationError,
    SearchFilter,
};
use super::repository::{ListingRepository, RepositoryError};
use crate::config::ListingConfig;
use crate::users::UserId;

/// Service wrapping the listing repository with validation and defaults.
pub struct ListingService<R> {
    repository: Arc<R>,
    config: ListingConfig,
}

impl<R> ListingService<R>
where
    R: ListingRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: ListingConfig) -> Self {
        Self { repository, config }
    }

    pub fn repository(&self) -> Arc<R> {
        Arc::clone(&self.repository)
    }

    /// List a house, expiring `duration_days` from now.
    pub async fn create(
        &self,
        draft: ListingDraft,
        owner: Option<UserId>,
    ) -> Result<Listing, ListingServiceError> {
        self.create_at(draft, owner, Utc::now()).await
    }

    /// Same as [`ListingService::create`] with an explicit creation time.
    pub async fn create_at(
        &self,
        draft: ListingDraft,
        owner: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Listing, ListingServiceError> {
        let new_listing = draft.validate(
            owner,
            now,
            self.config.default_coordinates,
            self.config.max_duration_days,
        )?;
        let listing = self.repository.insert(new_listing).await?;

        info!(
            listing_id = %listing.id,
            owner = ?listing.owner.map(|owner| owner.0),
            expires_at = %listing.expires_at,
            "listing created"
        );
        Ok(listing)
    }

    pub async fn get(&self, id: ListingId) -> Result<Listing, ListingServiceError> {
        let listing = self
            .repository
            .fetch(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(listing)
    }

    pub async fn search(&self, filter: &SearchFilter) -> Result<Vec<Listing>, ListingServiceError> {
        let listings = self.repository.search(filter).await?;
        debug!(matches = listings.len(), ?filter, "listing search");
        Ok(listings)
    }

    pub async fn record_interest(
        &self,
        id: ListingId,
    ) -> Result<InterestReceipt, ListingServiceError> {
        let interest_count = self.repository.increment_interest(id).await?;
        debug!(listing_id = %id, interest_count, "interest recorded");
        Ok(InterestReceipt { id, interest_count })
    }

    /// Listings whose expiry is strictly after `as_of`.
    pub async fn active_announcements(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<AnnouncementView>, ListingServiceError> {
        let listings = self.repository.active_since(as_of).await?;
        Ok(listings
            .iter()
            .map(|listing| listing.announcement(as_of))
            .collect())
    }

    pub async fn expiring_for_owner(
        &self,
        owner: UserId,
        now: DateTime<Utc>,
        lookahead: Duration,
    ) -> Result<Vec<Listing>, ListingServiceError> {
        let listings = self
            .repository
            .expiring_for_owner(owner, now, now + lookahead)
            .await?;
        Ok(listings)
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error(transparent)]
    Validation(#[from] ListingValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
