use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use super::domain::{ListingDraft, ListingId, MapMarker, SearchFilter};
use super::repository::ListingRepository;
use super::service::{ListingService, ListingServiceError};
use crate::http::{json_error, repository_error};
use crate::sessions::{SessionRegistry, SessionToken};

/// Shared handler state; the session registry resolves listing owners.
pub struct ListingRoutes<R> {
    pub listings: Arc<ListingService<R>>,
    pub sessions: Arc<SessionRegistry<R>>,
}

impl<R> Clone for ListingRoutes<R> {
    fn clone(&self) -> Self {
        Self {
            listings: Arc::clone(&self.listings),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnnouncementQuery {
    #[serde(default)]
    pub(crate) as_of: Option<DateTime<Utc>>,
}

/// Router builder exposing listing creation, search, interest, and announcements.
pub fn listing_router<R>(
    listings: Arc<ListingService<R>>,
    sessions: Arc<SessionRegistry<R>>,
) -> Router
where
    R: ListingRepository + 'static,
{
    Router::new()
        .route("/api/v1/listings", post(create_handler::<R>))
        .route("/api/v1/listings/search", get(search_handler::<R>))
        .route("/api/v1/listings/markers", get(markers_handler::<R>))
        .route(
            "/api/v1/listings/announcements",
            get(announcements_handler::<R>),
        )
        .route("/api/v1/listings/:listing_id", get(fetch_handler::<R>))
        .route(
            "/api/v1/listings/:listing_id/interest",
            post(interest_handler::<R>),
        )
        .with_state(ListingRoutes { listings, sessions })
}

fn service_error(error: ListingServiceError) -> Response {
    match error {
        ListingServiceError::Validation(err) => json_error(StatusCode::UNPROCESSABLE_ENTITY, err),
        ListingServiceError::Repository(err) => {
            warn!(error = %err, "listing repository call failed");
            repository_error(&err)
        }
    }
}

pub(crate) async fn create_handler<R>(
    State(state): State<ListingRoutes<R>>,
    headers: HeaderMap,
    Json(draft): Json<ListingDraft>,
) -> Response
where
    R: ListingRepository + 'static,
{
    // Anonymous listings are allowed, but a presented token has to be live.
    let owner = if headers.contains_key(header::AUTHORIZATION) {
        match SessionToken::from_headers(&headers).and_then(|token| state.sessions.resolve(token)) {
            Some(context) => Some(context.user.id),
            None => return json_error(StatusCode::UNAUTHORIZED, "no active session"),
        }
    } else {
        None
    };

    match state.listings.create(draft, owner).await {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn search_handler<R>(
    State(state): State<ListingRoutes<R>>,
    Query(filter): Query<SearchFilter>,
) -> Response
where
    R: ListingRepository + 'static,
{
    match state.listings.search(&filter).await {
        Ok(listings) => (StatusCode::OK, Json(listings)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn markers_handler<R>(
    State(state): State<ListingRoutes<R>>,
    Query(filter): Query<SearchFilter>,
) -> Response
where
    R: ListingRepository + 'static,
{
    match state.listings.search(&filter).await {
        Ok(listings) => {
            let markers: Vec<MapMarker> = listings.iter().map(|listing| listing.marker()).collect();
            (StatusCode::OK, Json(markers)).into_response()
        }
        Err(err) => service_error(err),
    }
}

pub(crate) async fn announcements_handler<R>(
    State(state): State<ListingRoutes<R>>,
    Query(query): Query<AnnouncementQuery>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let as_of = query.as_of.unwrap_or_else(Utc::now);
    match state.listings.active_announcements(as_of).await {
        Ok(announcements) => (StatusCode::OK, Json(announcements)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn fetch_handler<R>(
    State(state): State<ListingRoutes<R>>,
    Path(listing_id): Path<i64>,
) -> Response
where
    R: ListingRepository + 'static,
{
    match state.listings.get(ListingId(listing_id)).await {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn interest_handler<R>(
    State(state): State<ListingRoutes<R>>,
    Path(listing_id): Path<i64>,
) -> Response
where
    R: ListingRepository + 'static,
{
    match state.listings.record_interest(ListingId(listing_id)).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(err) => service_error(err),
    }
}
