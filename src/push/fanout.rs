use crate::error::Result;
use crate::ports;
use crate::push::drain::DrainCoordinator;
use crate::push::retention;
use crate::store::Database;
use crate::types::push::{NotifyRequest, NotifyResult, Subscription};

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

/// In-flight deliveries per `notify` call.
pub const PUSH_CONCURRENCY: usize = 10;
pub const PUSH_TTL_SECONDS: u32 = 86_400;
const WELCOME_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Failed,
    /// The push service reported the endpoint gone for good (404/410).
    Stale,
}

impl DeliveryOutcome {
    /// Status 0 stands for "no response" and classifies as a failure.
    pub fn classify(status_code: u16) -> Self {
        match status_code {
            200..=299 => DeliveryOutcome::Sent,
            404 | 410 => DeliveryOutcome::Stale,
            _ => DeliveryOutcome::Failed,
        }
    }
}

impl NotifyResult {
    /// A stale delivery counts in both `stale_removed` and `failed`.
    fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Sent => self.sent += 1,
            DeliveryOutcome::Failed => self.failed += 1,
            DeliveryOutcome::Stale => {
                self.stale_removed += 1;
                self.failed += 1;
            }
        }
    }
}

#[derive(Serialize)]
struct PushPayload<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    badge: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<&'a str>,
    // The service worker reads the click target from `data.url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<PushPayloadData<'a>>,
}

#[derive(Serialize)]
struct PushPayloadData<'a> {
    url: &'a str,
}

pub(crate) fn build_payload(request: &NotifyRequest) -> Result<Vec<u8>> {
    let payload = PushPayload {
        title: &request.title,
        body: non_empty(&request.body),
        icon: non_empty(&request.icon),
        badge: non_empty(&request.badge),
        tag: non_empty(&request.tag),
        data: non_empty(&request.url).map(|url| PushPayloadData { url }),
    };
    Ok(serde_json::to_vec(&payload)?)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// Fans notifications out to subscribers and keeps the delivery log.
#[derive(Clone)]
pub struct Notifier<S, T> {
    db: Arc<Database>,
    sender: S,
    time: T,
    drain: DrainCoordinator,
}

impl<S, T> Notifier<S, T>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    pub fn new(db: Arc<Database>, sender: S, time: T, drain: DrainCoordinator) -> Self {
        Self {
            db,
            sender,
            time,
            drain,
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn drain(&self) -> &DrainCoordinator {
        &self.drain
    }

    /// Delivers `request` to every subscriber of its topic (everyone for the
    /// empty topic). Only a failure to resolve subscribers is an error;
    /// individual delivery failures are reflected in the counts.
    pub async fn notify(&self, request: NotifyRequest) -> Result<NotifyResult> {
        let _in_flight = self.drain.token();
        let topic = request.topic.clone();
        let subscriptions = self
            .db
            .blocking(move |db| db.subscriptions_by_topic(&topic))
            .await?;
        let result = self.deliver(subscriptions, &request).await?;
        info!(
            topic = %request.topic,
            sent = result.sent,
            failed = result.failed,
            stale_removed = result.stale_removed,
            "notify complete"
        );
        Ok(result)
    }

    /// Runs [`Notifier::notify`] on its own task. The fan-out is registered
    /// with the drain before this returns and keeps running if the handle is
    /// dropped.
    pub fn spawn_notify(&self, request: NotifyRequest) -> JoinHandle<Result<NotifyResult>> {
        let notifier = self.clone();
        self.drain
            .spawn(async move { notifier.notify(request).await })
    }

    /// Greets a freshly registered subscriber, and only that subscriber.
    pub fn spawn_welcome(
        &self,
        subscription: Subscription,
        title: String,
    ) -> JoinHandle<Result<NotifyResult>> {
        let notifier = self.clone();
        self.drain.spawn(async move {
            notifier.time.sleep(WELCOME_DELAY).await;
            let subscription_id = subscription.id.clone();
            let request = NotifyRequest::titled(subscription.topic.clone(), title);
            let result = notifier.deliver(vec![subscription], &request).await?;
            debug!(
                subscription_id = %subscription_id,
                sent = result.sent,
                "welcome notification delivered"
            );
            Ok(result)
        })
    }

    pub async fn purge_delivery_log(&self, max_age: &str) -> Result<usize> {
        let time = self.time.clone();
        let max_age = max_age.to_string();
        self.db
            .blocking(move |db| retention::purge_delivery_log(db, &time, &max_age))
            .await
    }

    async fn deliver(
        &self,
        subscriptions: Vec<Subscription>,
        request: &NotifyRequest,
    ) -> Result<NotifyResult> {
        let mut result = NotifyResult::default();
        if subscriptions.is_empty() {
            return Ok(result);
        }

        let payload: Arc<[u8]> = build_payload(request)?.into();
        let semaphore = Arc::new(Semaphore::new(PUSH_CONCURRENCY));
        let mut deliveries = JoinSet::new();
        for subscription in subscriptions {
            let notifier = self.clone();
            let payload = Arc::clone(&payload);
            let semaphore = Arc::clone(&semaphore);
            deliveries.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                notifier.deliver_one(&subscription, &payload).await
            });
        }

        while let Some(joined) = deliveries.join_next().await {
            match joined {
                Ok(outcome) => result.record(outcome),
                Err(err) => {
                    error!("push delivery task failed: {err}");
                    result.record(DeliveryOutcome::Failed);
                }
            }
        }
        Ok(result)
    }

    /// One attempt: send, log, then evict if stale. The log entry is written
    /// before eviction so every attempt leaves a trace.
    async fn deliver_one(&self, subscription: &Subscription, payload: &[u8]) -> DeliveryOutcome {
        let (status_code, error) = match self
            .sender
            .send(subscription, payload, PUSH_TTL_SECONDS)
            .await
        {
            Ok(status_code) => (status_code, String::new()),
            Err(err) => (0, err.to_string()),
        };
        let outcome = DeliveryOutcome::classify(status_code);

        let sent_at = self.time.now();
        let subscription_id = subscription.id.clone();
        let logged = self
            .db
            .blocking(move |db| db.log_delivery(&subscription_id, status_code, &error, sent_at))
            .await;
        if let Err(err) = logged {
            error!(subscription_id = %subscription.id, "failed to log delivery: {err}");
        }

        if outcome == DeliveryOutcome::Stale {
            let subscription_id = subscription.id.clone();
            let removed = self
                .db
                .blocking(move |db| db.delete_subscription_by_id(&subscription_id))
                .await;
            match removed {
                Ok(_) => info!(
                    subscription_id = %subscription.id,
                    status_code,
                    "removed stale subscription"
                ),
                Err(err) => error!(
                    subscription_id = %subscription.id,
                    "failed to remove stale subscription: {err}"
                ),
            }
        }

        outcome
    }
}
