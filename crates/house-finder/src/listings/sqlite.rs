use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::domain::{
    from_storage_micros, storage_micros, Coordinates, Listing, ListingId, NewListing, SearchFilter,
};
use super::repository::{ListingRepository, RepositoryError};
use crate::users::UserId;

const LISTING_COLUMNS: &str = "id, user_id, price, bedrooms, year_built, garage_cars, lot_area, \
     overall_qual, image_path, expires_at, lat, lon, interest_count";

/// `ListingRepository` over the shared SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteListingRepository {
    pool: SqlitePool,
}

impl SqliteListingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ListingRow {
    id: i64,
    user_id: Option<i64>,
    price: f64,
    bedrooms: i64,
    year_built: i64,
    garage_cars: i64,
    lot_area: i64,
    overall_qual: i64,
    image_path: Option<String>,
    expires_at: i64,
    lat: f64,
    lon: f64,
    interest_count: i64,
}

impl TryFrom<ListingRow> for Listing {
    type Error = RepositoryError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt =
            |column: &str| RepositoryError::Unavailable(format!("listing {id} has corrupt {column}"));

        let expires_at =
            from_storage_micros(row.expires_at).ok_or_else(|| corrupt("expires_at"))?;

        Ok(Listing {
            id: ListingId(id),
            owner: row.user_id.map(UserId),
            price: row.price,
            bedrooms: u32::try_from(row.bedrooms).map_err(|_| corrupt("bedrooms"))?,
            year_built: i32::try_from(row.year_built).map_err(|_| corrupt("year_built"))?,
            garage_cars: u32::try_from(row.garage_cars).map_err(|_| corrupt("garage_cars"))?,
            lot_area: u32::try_from(row.lot_area).map_err(|_| corrupt("lot_area"))?,
            overall_qual: u8::try_from(row.overall_qual).map_err(|_| corrupt("overall_qual"))?,
            image_path: row.image_path,
            expires_at,
            coordinates: Coordinates {
                lat: row.lat,
                lon: row.lon,
            },
            interest_count: u64::try_from(row.interest_count)
                .map_err(|_| corrupt("interest_count"))?,
        })
    }
}

fn into_listings(rows: Vec<ListingRow>) -> Result<Vec<Listing>, RepositoryError> {
    rows.into_iter().map(Listing::try_from).collect()
}

#[async_trait]
impl ListingRepository for SqliteListingRepository {
    async fn insert(&self, listing: NewListing) -> Result<Listing, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO listings (user_id, price, bedrooms, year_built, garage_cars, lot_area, \
             overall_qual, image_path, expires_at, lat, lon) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(listing.owner.map(|owner| owner.0))
        .bind(listing.price)
        .bind(i64::from(listing.bedrooms))
        .bind(i64::from(listing.year_built))
        .bind(i64::from(listing.garage_cars))
        .bind(i64::from(listing.lot_area))
        .bind(i64::from(listing.overall_qual))
        .bind(listing.image_path.as_deref())
        .bind(storage_micros(listing.expires_at))
        .bind(listing.coordinates.lat)
        .bind(listing.coordinates.lon)
        .execute(&self.pool)
        .await?;

        Ok(listing.into_listing(ListingId(result.last_insert_rowid())))
    }

    async fn fetch(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?");
        let row: Option<ListingRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Listing::try_from).transpose()
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Listing>, RepositoryError> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE price <= ? AND bedrooms = ? \
             AND year_built >= ? AND garage_cars = ? AND lot_area >= ? AND overall_qual >= ? \
             ORDER BY id"
        );
        let rows: Vec<ListingRow> = sqlx::query_as(&sql)
            .bind(filter.max_price)
            .bind(i64::from(filter.bedrooms))
            .bind(i64::from(filter.min_year))
            .bind(i64::from(filter.garage_cars))
            .bind(i64::from(filter.min_lot_area))
            .bind(i64::from(filter.min_quality))
            .fetch_all(&self.pool)
            .await?;
        into_listings(rows)
    }

    async fn increment_interest(&self, id: ListingId) -> Result<u64, RepositoryError> {
        let count: Option<i64> = sqlx::query_scalar(
            "UPDATE listings SET interest_count = interest_count + 1 WHERE id = ? \
             RETURNING interest_count",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        let count = count.ok_or(RepositoryError::NotFound)?;
        u64::try_from(count)
            .map_err(|_| RepositoryError::Unavailable(format!("listing {id} has corrupt interest_count")))
    }

    async fn active_since(&self, as_of: DateTime<Utc>) -> Result<Vec<Listing>, RepositoryError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE expires_at > ? ORDER BY id");
        let rows: Vec<ListingRow> = sqlx::query_as(&sql)
            .bind(storage_micros(as_of))
            .fetch_all(&self.pool)
            .await?;
        into_listings(rows)
    }

    async fn expiring_for_owner(
        &self,
        owner: UserId,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Listing>, RepositoryError> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE user_id = ? AND expires_at > ? \
             AND expires_at <= ? ORDER BY expires_at, id"
        );
        let rows: Vec<ListingRow> = sqlx::query_as(&sql)
            .bind(owner.0)
            .bind(storage_micros(now))
            .bind(storage_micros(until))
            .fetch_all(&self.pool)
            .await?;
        into_listings(rows)
    }
}
