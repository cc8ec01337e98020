use chrono::{DateTime, Datelike, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::users::UserId;

/// Earliest construction year accepted for a listing.
pub const MIN_YEAR_BUILT: i32 = 1800;
/// How far past the current year a `year_built` may point (pre-construction sales).
pub const MAX_YEARS_AHEAD: i32 = 5;

/// Store-assigned listing identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub i64);

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic position of a house.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Default for Coordinates {
    /// Ames, Iowa.
    fn default() -> Self {
        Self {
            lat: 42.0347,
            lon: -93.6200,
        }
    }
}

/// A house offered for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner: Option<UserId>,
    pub price: f64,
    pub bedrooms: u32,
    pub year_built: i32,
    pub garage_cars: u32,
    pub lot_area: u32,
    pub overall_qual: u8,
    pub image_path: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub coordinates: Coordinates,
    pub interest_count: u64,
}

impl Listing {
    /// Soft expiry: the row stays in storage but drops out of announcements.
    pub fn is_active(&self, as_of: DateTime<Utc>) -> bool {
        self.expires_at > as_of
    }

    pub fn marker(&self) -> MapMarker {
        MapMarker {
            id: self.id,
            lat: self.coordinates.lat,
            lon: self.coordinates.lon,
            price: self.price,
        }
    }

    pub fn announcement(&self, as_of: DateTime<Utc>) -> AnnouncementView {
        AnnouncementView {
            days_left: (self.expires_at - as_of).num_days(),
            listing: self.clone(),
        }
    }
}

/// Caller-supplied fields for a new listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub price: f64,
    pub bedrooms: u32,
    pub year_built: i32,
    pub garage_cars: u32,
    pub lot_area: u32,
    pub overall_qual: u8,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub duration_days: i64,
}

impl ListingDraft {
    /// Checks every field and resolves defaults, producing the row the store persists.
    pub fn validate(
        self,
        owner: Option<UserId>,
        now: DateTime<Utc>,
        default_coordinates: Coordinates,
        max_duration_days: i64,
    ) -> Result<NewListing, ListingValidationError> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ListingValidationError::Price(self.price));
        }

        let latest_year = now.year() + MAX_YEARS_AHEAD;
        if self.year_built < MIN_YEAR_BUILT || self.year_built > latest_year {
            return Err(ListingValidationError::YearBuilt {
                found: self.year_built,
                min: MIN_YEAR_BUILT,
                max: latest_year,
            });
        }

        if !(1..=10).contains(&self.overall_qual) {
            return Err(ListingValidationError::Quality(self.overall_qual));
        }

        let coordinates = self.coordinates.unwrap_or(default_coordinates);
        if !(-90.0..=90.0).contains(&coordinates.lat)
            || !(-180.0..=180.0).contains(&coordinates.lon)
        {
            return Err(ListingValidationError::Coordinates(coordinates));
        }

        if self.duration_days < 1 || self.duration_days > max_duration_days {
            return Err(ListingValidationError::Duration {
                found: self.duration_days,
                max: max_duration_days,
            });
        }

        let image_path = self
            .image_path
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty());

        // Storage keeps microseconds; trim here so the created listing equals the stored one.
        let now = now.trunc_subsecs(6);

        Ok(NewListing {
            owner,
            price: self.price,
            bedrooms: self.bedrooms,
            year_built: self.year_built,
            garage_cars: self.garage_cars,
            lot_area: self.lot_area,
            overall_qual: self.overall_qual,
            image_path,
            expires_at: now + Duration::days(self.duration_days),
            coordinates,
        })
    }
}

/// Validated listing waiting for an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub owner: Option<UserId>,
    pub price: f64,
    pub bedrooms: u32,
    pub year_built: i32,
    pub garage_cars: u32,
    pub lot_area: u32,
    pub overall_qual: u8,
    pub image_path: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub coordinates: Coordinates,
}

impl NewListing {
    pub fn into_listing(self, id: ListingId) -> Listing {
        Listing {
            id,
            owner: self.owner,
            price: self.price,
            bedrooms: self.bedrooms,
            year_built: self.year_built,
            garage_cars: self.garage_cars,
            lot_area: self.lot_area,
            overall_qual: self.overall_qual,
            image_path: self.image_path,
            expires_at: self.expires_at,
            coordinates: self.coordinates,
            interest_count: 0,
        }
    }
}

/// Search criteria.
///
/// Bedrooms and garage capacity match exactly; the remaining bounds are inclusive
/// ranges. Missing query parameters fall back to the search form defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilter {
    pub max_price: f64,
    pub bedrooms: u32,
    pub min_year: i32,
    pub garage_cars: u32,
    pub min_lot_area: u32,
    pub min_quality: u8,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            max_price: 250_000.0,
            bedrooms: 3,
            min_year: 2000,
            garage_cars: 1,
            min_lot_area: 5000,
            min_quality: 5,
        }
    }
}

/// Point handed to map renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: ListingId,
    pub lat: f64,
    pub lon: f64,
    pub price: f64,
}

/// Active listing with the whole days remaining before it expires.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnouncementView {
    pub listing: Listing,
    pub days_left: i64,
}

/// Interest counter after an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterestReceipt {
    pub id: ListingId,
    pub interest_count: u64,
}

/// Rejections raised before any row is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingValidationError {
    #[error("price must be a non-negative amount (found {0})")]
    Price(f64),
    #[error("year built {found} outside {min}..={max}")]
    YearBuilt { found: i32, min: i32, max: i32 },
    #[error("overall quality must be between 1 and 10 (found {0})")]
    Quality(u8),
    #[error("coordinates out of range: {0:?}")]
    Coordinates(Coordinates),
    #[error("listing duration must be between 1 and {max} days (found {found})")]
    Duration { found: i64, max: i64 },
}

/// Expiry is stored as integer microseconds since the Unix epoch so SQLite compares numbers.
pub(crate) fn storage_micros(value: DateTime<Utc>) -> i64 {
    value.timestamp_micros()
}

pub(crate) fn from_storage_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}
