use std::future::Future;
use std::time::Duration;

use time::OffsetDateTime;

/// Clock and timer source for every delay in the page layer.
pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime;
    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a>;
}
