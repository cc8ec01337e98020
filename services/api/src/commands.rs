use crate::infra::parse_timestamp;
use chrono::{DateTime, Utc};
use clap::Args;
use house_finder::config::AppConfig;
use house_finder::db::connect_and_migrate;
use house_finder::error::AppError;
use house_finder::estimate::PriceFeatures;
use house_finder::listings::{AnnouncementView, ListingService, SqliteListingRepository};
use house_finder::{app, telemetry};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct AnnouncementArgs {
    /// Evaluate expiry at this RFC 3339 instant instead of now
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) as_of: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// Above-grade living area in square feet
    #[arg(long)]
    pub(crate) living_area: u32,
    #[arg(long)]
    pub(crate) bedrooms: u32,
    #[arg(long)]
    pub(crate) year_built: i32,
    /// Garage capacity in cars
    #[arg(long)]
    pub(crate) garage_cars: u32,
    /// Lot area in square feet
    #[arg(long)]
    pub(crate) lot_area: u32,
    /// Overall material and finish quality (1-10)
    #[arg(long)]
    pub(crate) overall_qual: u8,
}

impl From<EstimateArgs> for PriceFeatures {
    fn from(args: EstimateArgs) -> Self {
        Self {
            living_area: args.living_area,
            bedrooms: args.bedrooms,
            year_built: args.year_built,
            garage_cars: args.garage_cars,
            lot_area: args.lot_area,
            overall_qual: args.overall_qual,
        }
    }
}

pub(crate) async fn run_init_db() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let pool = connect_and_migrate(&config.database).await?;
    pool.close().await;
    println!("Database ready at {}", config.database.url);
    Ok(())
}

pub(crate) async fn run_announcements(args: AnnouncementArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let pool = connect_and_migrate(&config.database).await?;
    let service = ListingService::new(
        Arc::new(SqliteListingRepository::new(pool.clone())),
        config.listings.clone(),
    );

    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let announcements = service.active_announcements(as_of).await;
    pool.close().await;

    render_announcements(&announcements?, as_of);
    Ok(())
}

fn render_announcements(announcements: &[AnnouncementView], as_of: DateTime<Utc>) {
    println!("Active listings as of {}", as_of.format("%Y-%m-%d %H:%M UTC"));
    if announcements.is_empty() {
        println!("- none");
        return;
    }

    for view in announcements {
        let listing = &view.listing;
        println!(
            "- #{} ${:.0} | {} bd | built {} | {} car garage | {} sq ft lot | quality {}",
            listing.id,
            listing.price,
            listing.bedrooms,
            listing.year_built,
            listing.garage_cars,
            listing.lot_area,
            listing.overall_qual
        );
        println!(
            "  {} day(s) left | {} interested | ({:.4}, {:.4})",
            view.days_left, listing.interest_count, listing.coordinates.lat, listing.coordinates.lon
        );
    }
}

pub(crate) fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let estimator = app::load_estimator(&config)?;
    let features = PriceFeatures::from(args);

    let estimate = estimator.estimate(&features)?;
    println!(
        "Estimated price: ${:.0} ({} model)",
        estimate.estimated_price, estimate.model
    );
    Ok(())
}
