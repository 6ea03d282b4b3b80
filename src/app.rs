use crate::error::Error;
use crate::ports;
use crate::state;

use axum::Json;
use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware;
use axum::routing::{delete, get, post};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

mod admin;
mod auth;
mod push;

pub fn app<S, T>(state: state::AppState<S, T>) -> Router
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let cors = cors_layer(&state.config.cors_origin);
    let admin_routes = Router::new()
        .route("/subscriptions", get(admin::list_subscriptions::<S, T>))
        .route(
            "/subscriptions/{id}",
            delete(admin::delete_subscription::<S, T>),
        )
        .route("/notify", post(admin::notify::<S, T>))
        .route("/delivery-log", delete(admin::purge_delivery_log::<S, T>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin::<S, T>,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/vapid-public-key", get(push::vapid_public_key::<S, T>))
        .route(
            "/subscriptions",
            post(push::subscribe::<S, T>).delete(push::unsubscribe::<S, T>),
        )
        .merge(admin_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(origin) {
            Ok(origin) => AllowOrigin::exact(origin),
            Err(err) => {
                warn!(origin, "ignoring invalid CORS origin: {err}");
                AllowOrigin::list([])
            }
        }
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Maps a domain error onto a response. Storage details stay in the log.
pub(crate) fn error_response(context: &str, err: Error) -> ApiError {
    match err {
        Error::InvalidDuration(_) => api_error(StatusCode::BAD_REQUEST, err.to_string()),
        err => {
            error!("{context}: {err}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}
