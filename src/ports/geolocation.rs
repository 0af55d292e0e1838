use std::future::Future;
use std::time::Duration;

use crate::error::GeolocationError;
use crate::geo::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix that may be returned instead of a fresh one.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
        }
    }
}

pub trait Geolocator: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = Result<LatLng, GeolocationError>> + Send + 'a
    where
        Self: 'a;

    fn current_position<'a>(&'a self, options: &'a PositionOptions) -> Self::Fut<'a>;
}
