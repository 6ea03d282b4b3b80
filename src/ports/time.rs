use std::time::Duration;

use time::OffsetDateTime;

/// Clock used to stamp delivery log entries, compute purge cutoffs and delay
/// welcome notifications.
pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime;
    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a>;

    /// `now()` moved back by `age`, or `None` if that leaves the representable range.
    fn before_now(&self, age: time::Duration) -> Option<OffsetDateTime> {
        self.now().checked_sub(age)
    }
}
