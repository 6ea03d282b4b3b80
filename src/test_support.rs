use crate::ports;
use crate::types::push::Subscription;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::sync::Semaphore;

pub(crate) const TEST_NOW: OffsetDateTime = datetime!(2025-01-12 09:30:00 UTC);

#[derive(Clone)]
pub(crate) struct TestTime {
    now: OffsetDateTime,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl TestTime {
    pub(crate) fn new(now: OffsetDateTime) -> Self {
        Self {
            now,
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn sleep_durations(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleeps lock").clone()
    }
}

impl Default for TestTime {
    fn default() -> Self {
        Self::new(TEST_NOW)
    }
}

impl ports::TimeProvider for TestTime {
    type Sleep<'a>
        = std::future::Ready<()>
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        self.now
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        self.sleeps.lock().expect("sleeps lock").push(duration);
        std::future::ready(())
    }
}

#[derive(Debug)]
pub(crate) struct TestSendError(String);

impl std::fmt::Display for TestSendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SentPush {
    pub(crate) endpoint: String,
    pub(crate) payload: Vec<u8>,
    pub(crate) ttl_seconds: u32,
}

/// Answers 201 unless an endpoint has a scripted response.
#[derive(Clone, Default)]
pub(crate) struct TestSender {
    responses: Arc<Mutex<HashMap<String, Result<u16, String>>>>,
    sent: Arc<Mutex<Vec<SentPush>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
}

impl TestSender {
    pub(crate) fn respond(self, endpoint: &str, status: u16) -> Self {
        self.script(endpoint, Ok(status))
    }

    pub(crate) fn fail(self, endpoint: &str, error: &str) -> Self {
        self.script(endpoint, Err(error.to_string()))
    }

    fn script(self, endpoint: &str, response: Result<u16, String>) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .insert(endpoint.to_string(), response);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Each send waits for one permit of `gate` before answering.
    pub(crate) fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl ports::PushSender for TestSender {
    type Error = TestSendError;
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
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(gate) = &self.gate
                && let Ok(permit) = gate.acquire().await
            {
                permit.forget();
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.sent.lock().expect("sent lock").push(SentPush {
                endpoint: subscription.endpoint.clone(),
                payload: payload.to_vec(),
                ttl_seconds,
            });
            let response = self
                .responses
                .lock()
                .expect("responses lock")
                .get(&subscription.endpoint)
                .cloned();
            response.unwrap_or(Ok(201)).map_err(TestSendError)
        })
    }
}
