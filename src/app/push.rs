use crate::ports;
use crate::state;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::{info, warn};

use super::{ApiError, api_error, error_response};

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "vapidPublicKey")]
    pub(crate) vapid_public_key: String,
}

pub(crate) async fn vapid_public_key<S, T>(
    State(state): State<state::AppState<S, T>>,
) -> Json<PublicKeyResponse>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    Json(PublicKeyResponse {
        vapid_public_key: state.config.vapid.public_key.clone(),
    })
}

/// Browser `PushSubscription.toJSON()` shape plus the topic to file it under.
#[derive(Debug, Deserialize)]
pub(crate) struct SubscribeRequest {
    #[serde(default)]
    pub(crate) topic: String,
    pub(crate) subscription: BrowserSubscription,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BrowserSubscription {
    pub(crate) endpoint: String,
    pub(crate) keys: BrowserSubscriptionKeys,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BrowserSubscriptionKeys {
    pub(crate) p256dh: String,
    pub(crate) auth: String,
}

#[derive(Serialize)]
pub(crate) struct SubscribeResponse {
    pub(crate) id: String,
}

pub(crate) async fn subscribe<S, T>(
    State(state): State<state::AppState<S, T>>,
    Json(request): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscribeResponse>), ApiError>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let subscription = request.subscription;
    if subscription.endpoint.is_empty()
        || subscription.keys.p256dh.is_empty()
        || subscription.keys.auth.is_empty()
    {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "subscription.endpoint, keys.p256dh and keys.auth are required",
        ));
    }

    let db = state.notifier.database();
    let topic = request.topic.clone();
    let upsert = db
        .blocking(move |db| {
            db.upsert_subscription(
                &topic,
                &subscription.endpoint,
                &subscription.keys.p256dh,
                &subscription.keys.auth,
            )
        })
        .await
        .map_err(|err| error_response("failed to save subscription", err))?;
    let id = upsert.id().to_string();

    if !upsert.is_created() {
        return Ok((StatusCode::OK, Json(SubscribeResponse { id })));
    }
    info!(subscription_id = %id, topic = %request.topic, "subscription created");

    if let Some(title) = state
        .config
        .welcome_message
        .as_deref()
        .filter(|title| !title.is_empty())
    {
        let lookup_id = id.clone();
        match db.blocking(move |db| db.subscription(&lookup_id)).await {
            Ok(Some(created)) => {
                state.notifier.spawn_welcome(created, title.to_string());
            }
            Ok(None) => {}
            Err(err) => warn!(subscription_id = %id, "skipping welcome notification: {err}"),
        }
    }

    Ok((StatusCode::CREATED, Json(SubscribeResponse { id })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UnsubscribeRequest {
    pub(crate) endpoint: String,
}

pub(crate) async fn unsubscribe<S, T>(
    State(state): State<state::AppState<S, T>>,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<StatusCode, ApiError>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    if request.endpoint.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "endpoint is required"));
    }
    state
        .notifier
        .database()
        .blocking(move |db| db.delete_subscription_by_endpoint(&request.endpoint))
        .await
        .map_err(|err| error_response("failed to delete subscription", err))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::app::tests::{body_json, json_request, send, test_state, test_state_with};
    use crate::config::AppConfig;
    use crate::test_support::TestSender;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{Value as JsonValue, json};

    fn subscribe_body(topic: &str, endpoint: &str, p256dh: &str) -> JsonValue {
        json!({
            "topic": topic,
            "subscription": {
                "endpoint": endpoint,
                "keys": { "p256dh": p256dh, "auth": "auth-secret" }
            }
        })
    }

    #[tokio::test]
    async fn vapid_public_key__should_return_configured_key() {
        // Given
        let state = test_state();

        // When
        let response = send(
            &state,
            Request::builder()
                .uri("/vapid-public-key")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "vapidPublicKey": state.config.vapid.public_key })
        );
    }

    #[tokio::test]
    async fn subscribe__should_create_then_update_same_endpoint() {
        // Given
        let state = test_state();

        // When
        let created = send(
            &state,
            json_request(
                Method::POST,
                "/subscriptions",
                subscribe_body("news", "https://push.example/1", "key-1"),
            ),
        )
        .await;
        let created_status = created.status();
        let created_id = body_json(created).await["id"].clone();
        let updated = send(
            &state,
            json_request(
                Method::POST,
                "/subscriptions",
                subscribe_body("alerts", "https://push.example/1", "key-2"),
            ),
        )
        .await;

        // Then
        assert_eq!(created_status, StatusCode::CREATED);
        assert_eq!(updated.status(), StatusCode::OK);
        assert_eq!(body_json(updated).await["id"], created_id);
        let stored = state
            .notifier
            .database()
            .subscriptions_by_topic("")
            .expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].topic, "alerts");
        assert_eq!(stored[0].p256dh, "key-2");
    }

    #[tokio::test]
    async fn subscribe__should_reject_missing_fields() {
        // Given
        let state = test_state();
        let bodies = [
            subscribe_body("", "", "key"),
            subscribe_body("", "https://push.example/1", ""),
            json!({ "topic": "news" }),
            json!({ "subscription": { "endpoint": "https://push.example/1" } }),
        ];

        for body in bodies {
            // When
            let response = send(&state, json_request(Method::POST, "/subscriptions", body)).await;

            // Then
            assert!(response.status().is_client_error());
        }
        assert!(
            state
                .notifier
                .database()
                .subscriptions_by_topic("")
                .expect("list")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn subscribe__should_send_welcome_only_on_creation() {
        // Given
        let sender = TestSender::default();
        let state = test_state_with(
            AppConfig {
                welcome_message: Some("Thanks for subscribing".to_string()),
                ..AppConfig::default()
            },
            sender.clone(),
        );
        let body = subscribe_body("", "https://push.example/1", "key");

        // When
        send(&state, json_request(Method::POST, "/subscriptions", body.clone())).await;
        send(&state, json_request(Method::POST, "/subscriptions", body)).await;
        state.notifier.drain().wait().await;

        // Then
        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].endpoint, "https://push.example/1");
        let payload: JsonValue = serde_json::from_slice(&sent[0].payload).expect("json");
        assert_eq!(payload, json!({ "title": "Thanks for subscribing" }));
    }

    #[tokio::test]
    async fn unsubscribe__should_remove_subscription_and_be_idempotent() {
        // Given
        let state = test_state();
        send(
            &state,
            json_request(
                Method::POST,
                "/subscriptions",
                subscribe_body("", "https://push.example/1", "key"),
            ),
        )
        .await;

        for _ in 0..2 {
            // When
            let response = send(
                &state,
                json_request(
                    Method::DELETE,
                    "/subscriptions",
                    json!({ "endpoint": "https://push.example/1" }),
                ),
            )
            .await;

            // Then
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }
        assert!(
            state
                .notifier
                .database()
                .subscriptions_by_topic("")
                .expect("list")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn unsubscribe__should_reject_empty_endpoint() {
        // Given
        let state = test_state();

        // When
        let response = send(
            &state,
            json_request(Method::DELETE, "/subscriptions", json!({ "endpoint": "" })),
        )
        .await;

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "endpoint is required" })
        );
    }
}
