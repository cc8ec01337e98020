//! Wiring of repositories, services, and routers over one SQLite pool.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::estimate::{estimate_router, LinearPriceModel, PriceEstimator};
use crate::listings::{listing_router, ListingService, SqliteListingRepository};
use crate::sessions::{session_router, SessionRegistry};
use crate::users::{user_router, SqliteUserRepository, UserService};

/// Everything the HTTP layer and CLI need, sharing one pool.
#[derive(Clone)]
pub struct HouseFinder {
    pub listings: Arc<ListingService<SqliteListingRepository>>,
    pub users: Arc<UserService<SqliteUserRepository>>,
    pub sessions: Arc<SessionRegistry<SqliteListingRepository>>,
    pub estimator: Arc<PriceEstimator>,
}

impl HouseFinder {
    pub fn new(
        pool: SqlitePool,
        config: &AppConfig,
        estimator: PriceEstimator,
        shutdown: CancellationToken,
    ) -> Self {
        let listing_repository = Arc::new(SqliteListingRepository::new(pool.clone()));
        let user_repository = Arc::new(SqliteUserRepository::new(pool));

        let listings = Arc::new(ListingService::new(
            Arc::clone(&listing_repository),
            config.listings.clone(),
        ));
        let users = Arc::new(UserService::new(user_repository));
        let sessions = Arc::new(
            SessionRegistry::with_shutdown(listing_repository, config.notifier, shutdown)
                .with_ttl(config.sessions.ttl),
        );

        Self {
            listings,
            users,
            sessions,
            estimator: Arc::new(estimator),
        }
    }

    /// All API routes; health and metrics are layered on by the binary.
    pub fn router(&self) -> Router {
        listing_router(Arc::clone(&self.listings), Arc::clone(&self.sessions))
            .merge(user_router(Arc::clone(&self.users), Arc::clone(&self.sessions)))
            .merge(session_router(Arc::clone(&self.sessions)))
            .merge(estimate_router(Arc::clone(&self.estimator)))
    }
}

/// Loads the configured model file, or the baseline when none is set.
pub fn load_estimator(config: &AppConfig) -> Result<PriceEstimator, AppError> {
    let model = match &config.model.path {
        Some(path) => {
            let model = LinearPriceModel::load(path)?;
            info!(path = %path.display(), model = %model.name, "price model loaded");
            model
        }
        None => {
            warn!("PRICE_MODEL_PATH not set; using baseline price model");
            LinearPriceModel::baseline()
        }
    };
    Ok(PriceEstimator::new(Arc::new(model)))
}
