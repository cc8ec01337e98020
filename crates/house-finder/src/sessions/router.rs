use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::{SessionRegistry, SessionToken};
use crate::http::json_error;
use crate::listings::ListingRepository;

/// Routes reading the caller's own session.
pub fn session_router<R>(sessions: Arc<SessionRegistry<R>>) -> Router
where
    R: ListingRepository + 'static,
{
    Router::new()
        .route("/api/v1/session", get(whoami_handler::<R>))
        .route(
            "/api/v1/session/notifications",
            get(notifications_handler::<R>),
        )
        .with_state(sessions)
}

pub(crate) async fn whoami_handler<R>(
    State(sessions): State<Arc<SessionRegistry<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: ListingRepository + 'static,
{
    let Some(context) = SessionToken::from_headers(&headers).and_then(|token| sessions.resolve(token))
    else {
        return json_error(StatusCode::UNAUTHORIZED, "no active session");
    };

    let payload = json!({
        "token": context.token,
        "user": context.user,
        "opened_at": context.opened_at,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn notifications_handler<R>(
    State(sessions): State<Arc<SessionRegistry<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: ListingRepository + 'static,
{
    let Some(context) = SessionToken::from_headers(&headers).and_then(|token| sessions.resolve(token))
    else {
        return json_error(StatusCode::UNAUTHORIZED, "no active session");
    };

    let payload = json!({ "notification": context.notification() });
    (StatusCode::OK, Json(payload)).into_response()
}
