use crate::types::push::Subscription;

/// Encrypts, signs and posts one push message.
///
/// `Ok` carries the raw HTTP status returned by the push service, whatever it
/// is. `Err` means no response was obtained at all (transport failure).
pub trait PushSender: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type Fut<'a>: Future<Output = Result<u16, Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a Subscription,
        payload: &'a [u8],
        ttl_seconds: u32,
    ) -> Self::Fut<'a>;
}
