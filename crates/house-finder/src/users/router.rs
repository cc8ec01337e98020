use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use super::domain::{Credentials, Registration};
use super::repository::{RepositoryError, UserRepository};
use super::service::{UserService, UserServiceError};
use crate::http::{json_error, repository_error};
use crate::listings::ListingRepository;
use crate::sessions::{SessionRegistry, SessionToken};

pub struct UserRoutes<U, R> {
    pub users: Arc<UserService<U>>,
    pub sessions: Arc<SessionRegistry<R>>,
}

impl<U, R> Clone for UserRoutes<U, R> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

/// Router builder for registration, login, and logout.
pub fn user_router<U, R>(users: Arc<UserService<U>>, sessions: Arc<SessionRegistry<R>>) -> Router
where
    U: UserRepository + 'static,
    R: ListingRepository + 'static,
{
    Router::new()
        .route("/api/v1/users/register", post(register_handler::<U, R>))
        .route("/api/v1/users/login", post(login_handler::<U, R>))
        .route("/api/v1/users/logout", post(logout_handler::<U, R>))
        .with_state(UserRoutes { users, sessions })
}

fn service_error(error: UserServiceError) -> Response {
    match error {
        UserServiceError::Validation(err) => json_error(StatusCode::UNPROCESSABLE_ENTITY, err),
        UserServiceError::Repository(RepositoryError::Conflict) => {
            json_error(StatusCode::CONFLICT, "username already exists")
        }
        UserServiceError::Repository(err) => repository_error(&err),
        UserServiceError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, UserServiceError::InvalidCredentials)
        }
    }
}

pub(crate) async fn register_handler<U, R>(
    State(state): State<UserRoutes<U, R>>,
    Json(registration): Json<Registration>,
) -> Response
where
    U: UserRepository + 'static,
    R: ListingRepository + 'static,
{
    match state.users.register(registration).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn login_handler<U, R>(
    State(state): State<UserRoutes<U, R>>,
    Json(credentials): Json<Credentials>,
) -> Response
where
    U: UserRepository + 'static,
    R: ListingRepository + 'static,
{
    match state.users.authenticate(credentials).await {
        Ok(user) => {
            let context = state.sessions.open(user);
            let payload = json!({
                "token": context.token,
                "user": context.user,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => service_error(err),
    }
}

pub(crate) async fn logout_handler<U, R>(
    State(state): State<UserRoutes<U, R>>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + 'static,
    R: ListingRepository + 'static,
{
    match SessionToken::from_headers(&headers) {
        Some(token) if state.sessions.close(token) => StatusCode::NO_CONTENT.into_response(),
        _ => json_error(StatusCode::UNAUTHORIZED, "no active session"),
    }
}
