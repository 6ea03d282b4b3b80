pub mod drain;
pub mod fanout;
pub mod retention;
pub mod vapid;

pub use drain::DrainCoordinator;
pub use fanout::{DeliveryOutcome, Notifier, PUSH_CONCURRENCY, PUSH_TTL_SECONDS};
pub use retention::{DEFAULT_MAX_AGE, parse_max_age};
pub use vapid::VapidKeys;
