use crate::ports;
use crate::push::retention::DEFAULT_MAX_AGE;
use crate::state;
use crate::types::push::{NotifyRequest, NotifyResult, SubscriptionSummary};

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::error;

use super::{ApiError, api_error, error_response};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TopicQuery {
    pub(crate) topic: String,
}

#[derive(Serialize)]
pub(crate) struct SubscriptionListResponse {
    pub(crate) subscriptions: Vec<SubscriptionSummary>,
}

pub(crate) async fn list_subscriptions<S, T>(
    State(state): State<state::AppState<S, T>>,
    Query(query): Query<TopicQuery>,
) -> Result<Json<SubscriptionListResponse>, ApiError>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let subscriptions = state
        .notifier
        .database()
        .blocking(move |db| db.list_subscriptions(&query.topic))
        .await
        .map_err(|err| error_response("failed to list subscriptions", err))?;
    Ok(Json(SubscriptionListResponse { subscriptions }))
}

pub(crate) async fn delete_subscription<S, T>(
    State(state): State<state::AppState<S, T>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    state
        .notifier
        .database()
        .blocking(move |db| db.delete_subscription_by_id(&id))
        .await
        .map_err(|err| error_response("failed to delete subscription", err))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Runs the fan-out on its own task; the response waits for it, but a dropped
/// connection does not cancel it.
pub(crate) async fn notify<S, T>(
    State(state): State<state::AppState<S, T>>,
    Json(request): Json<NotifyRequest>,
) -> Result<Json<NotifyResult>, ApiError>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    if request.title.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "title is required"));
    }
    match state.notifier.spawn_notify(request).await {
        Ok(result) => result
            .map(Json)
            .map_err(|err| error_response("notify failed", err)),
        Err(err) => {
            error!("notify task failed: {err}");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error",
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PurgeQuery {
    pub(crate) older_than: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct PurgeResponse {
    pub(crate) deleted: usize,
}

pub(crate) async fn purge_delivery_log<S, T>(
    State(state): State<state::AppState<S, T>>,
    Query(query): Query<PurgeQuery>,
) -> Result<Json<PurgeResponse>, ApiError>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let max_age = query
        .older_than
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .unwrap_or(DEFAULT_MAX_AGE);
    let deleted = state
        .notifier
        .purge_delivery_log(max_age)
        .await
        .map_err(|err| error_response("failed to purge delivery log", err))?;
    Ok(Json(PurgeResponse { deleted }))
}
