//! Implementations of the ports that ship with the crate.

pub mod geolocation;
pub mod http;
pub mod memory_dom;
pub mod scene;

use std::time::Duration;

use time::OffsetDateTime;

use crate::ports;

pub use geolocation::{FixedGeolocator, UnavailableGeolocator};
pub use http::HttpBackend;
pub use memory_dom::{Element, MemoryDom};
pub use scene::{MapScene, SceneBackend, SceneMap};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}
