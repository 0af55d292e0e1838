use std::future::Ready;

use crate::error::GeolocationError;
use crate::geo::LatLng;
use crate::ports::{Geolocator, PositionOptions};

/// Always reports the same position, e.g. one given on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    position: LatLng,
}

impl FixedGeolocator {
    pub fn new(position: LatLng) -> Self {
        Self { position }
    }
}

impl Geolocator for FixedGeolocator {
    type Fut<'a>
        = Ready<Result<LatLng, GeolocationError>>
    where
        Self: 'a;

    fn current_position<'a>(&'a self, _options: &'a PositionOptions) -> Self::Fut<'a> {
        std::future::ready(Ok(self.position))
    }
}

/// For hosts without any location source.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableGeolocator;

impl Geolocator for UnavailableGeolocator {
    type Fut<'a>
        = Ready<Result<LatLng, GeolocationError>>
    where
        Self: 'a;

    fn current_position<'a>(&'a self, _options: &'a PositionOptions) -> Self::Fut<'a> {
        std::future::ready(Err(GeolocationError::Unsupported))
    }
}
