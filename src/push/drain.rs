use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tokio_util::task::task_tracker::TaskTrackerToken;

/// Counts in-flight fan-outs so shutdown can wait for them instead of
/// tearing the database down underneath them.
#[derive(Debug, Clone, Default)]
pub struct DrainCoordinator {
    tracker: TaskTracker,
}

impl DrainCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one in-flight operation until the token is dropped.
    pub fn token(&self) -> TaskTrackerToken {
        self.tracker.token()
    }

    /// Spawns `future` on the runtime. It is counted from this call on, not
    /// from its first poll.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(future)
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Resolves once nothing is in flight. Registering more work afterwards
    /// is still allowed, and a later `wait` observes it.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
