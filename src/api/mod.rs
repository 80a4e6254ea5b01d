//! HTTP surface: router assembly, shared state, and error mapping.

pub mod objects;
pub mod places;
pub mod users;

use crate::{
    auth::{self, JwtHandler},
    notify,
    store::Store,
};
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub jwt: Arc<JwtHandler>,
    pub notices: broadcast::Sender<notify::FoundObjectNotice>,
}

impl AppState {
    pub fn new(store: Arc<Store>, jwt: Arc<JwtHandler>) -> Self {
        Self {
            store,
            jwt,
            notices: notify::channel(),
        }
    }
}

/// Build the full application router.
///
/// Reads are public; mutations (and nothing else) sit behind the bearer
/// gate. What an authenticated caller may then do is decided per resource
/// by the policy table, not here.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/login", post(auth::api::login))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/objects", get(users::get_user_objects))
        .route("/places", get(places::list_places))
        .route("/places/:id", get(places::get_place))
        .route("/objects", get(objects::list_objects))
        .route("/objects/:id", get(objects::get_object))
        .route("/ws", get(notify::websocket_handler));

    let protected = Router::new()
        .route(
            "/users/:id",
            put(users::update_user).delete(users::delete_user),
        )
        .route("/places", post(places::create_place))
        .route(
            "/places/:id",
            put(places::update_place).delete(places::delete_place),
        )
        .route("/objects", post(objects::create_object))
        .route(
            "/objects/:id",
            put(objects::update_object).delete(objects::delete_object),
        )
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "Lost and found backend operational"
}

/// Failures shared by the resource handlers, mapped to plain-text responses.
#[derive(Debug)]
pub enum ApiError {
    Forbidden,
    NotFound(&'static str),
    /// Malformed or missing fields. Surfaces as 500, matching the behavior
    /// the original API shipped with.
    Validation(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Don't have the rights to do that".to_string(),
            ),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ApiError::Validation(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, message).into_response()
    }
}
