use std::pin::Pin;
use std::time::Duration;

use time::OffsetDateTime;
use web_push::{ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessageBuilder};

use crate::ports;
use crate::types::push::{Subscription, VapidConfig};

const PUSH_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebPushSendError {
    #[error("failed to build push message: {0}")]
    Message(#[from] web_push::WebPushError),
    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Encrypts with `web_push` and posts with `reqwest` so the push service's
/// status code reaches the caller untouched.
#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: reqwest::Client,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, WebPushSendError> {
        let client = reqwest::Client::builder()
            .timeout(PUSH_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { vapid, client })
    }

    fn build_request(
        &self,
        subscription: &Subscription,
        payload: &[u8],
        ttl_seconds: u32,
    ) -> Result<reqwest::RequestBuilder, WebPushSendError> {
        let subscription_info = SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.p256dh.clone(),
            subscription.auth.clone(),
        );
        let mut signature_builder =
            VapidSignatureBuilder::from_base64(&self.vapid.private_key, &subscription_info)?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());

        let mut builder = WebPushMessageBuilder::new(&subscription_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature_builder.build()?);
        builder.set_ttl(ttl_seconds);
        let message = builder.build()?;

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());
        if let Some(push_payload) = message.payload {
            request = request
                .header("Content-Encoding", push_payload.content_encoding.to_str())
                .header("Content-Type", "application/octet-stream");
            for (key, value) in &push_payload.crypto_headers {
                request = request.header(*key, value.as_str());
            }
            request = request.body(push_payload.content);
        }
        Ok(request)
    }
}

impl ports::PushSender for WebPushSender {
    type Error = WebPushSendError;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<u16, Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a Subscription,
        payload: &'a [u8],
        ttl_seconds: u32,
    ) -> Self::Fut<'a> {
        Box::pin(async move {
            let request = self.build_request(subscription, payload, ttl_seconds)?;
            let response = request.send().await?;
            Ok(response.status().as_u16())
        })
    }
}
