use crate::ports;
use crate::state;

use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::api_error;

pub(crate) async fn require_admin<S, T>(
    State(state): State<state::AppState<S, T>>,
    req: Request<Body>,
    next: Next,
) -> Response
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    match bearer_token(req.headers()) {
        Some(token) if token == state.config.admin_key => next.run(req).await,
        _ => api_error(StatusCode::UNAUTHORIZED, "unauthorized").into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::app::tests::{ADMIN_KEY, body_json, send, test_state};
    use axum::http::{HeaderValue, Method};
    use serde_json::json;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).expect("header"));
        headers
    }

    #[test]
    fn bearer_token__should_extract_token_after_scheme() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn require_admin__should_reject_missing_or_wrong_token() {
        // Given
        let state = test_state();

        for authorization in [None, Some("Bearer nope"), Some(ADMIN_KEY)] {
            // When
            let mut request = Request::builder().method(Method::GET).uri("/subscriptions");
            if let Some(authorization) = authorization {
                request = request.header(AUTHORIZATION, authorization);
            }
            let response = send(&state, request.body(Body::empty()).expect("request")).await;

            // Then
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(body_json(response).await, json!({ "error": "unauthorized" }));
        }
    }

    #[tokio::test]
    async fn require_admin__should_guard_every_admin_route() {
        // Given
        let state = test_state();
        let routes = [
            (Method::GET, "/subscriptions"),
            (Method::DELETE, "/subscriptions/abc"),
            (Method::POST, "/notify"),
            (Method::DELETE, "/delivery-log"),
        ];

        for (method, uri) in routes {
            // When
            let response = send(
                &state,
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await;

            // Then
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }
}
