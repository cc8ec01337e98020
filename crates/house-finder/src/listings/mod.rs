//! Listing lifecycle: creation, search, interest tracking, and soft expiry.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod sqlite;

pub use domain::{
    AnnouncementView, Coordinates, InterestReceipt, Listing, ListingDraft, ListingId,
    ListingValidationError, MapMarker, NewListing, SearchFilter,
};
pub use repository::{ListingRepository, RepositoryError};
pub use router::{listing_router, ListingRoutes};
pub use service::{ListingService, ListingServiceError};
pub use sqlite::SqliteListingRepository;
