use crate::adapters::{TokioTimeProvider, WebPushSender};
use crate::config::AppConfig;
use crate::ports;
use crate::push::fanout::Notifier;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState<S = WebPushSender, T = TokioTimeProvider> {
    pub config: Arc<AppConfig>,
    pub notifier: Notifier<S, T>,
}

impl<S, T> AppState<S, T>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    pub fn new(config: AppConfig, notifier: Notifier<S, T>) -> Self {
        Self {
            config: Arc::new(config),
            notifier,
        }
    }
}
