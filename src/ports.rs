//! Capabilities the page layer needs from its host.
//!
//! Controllers are generic over these traits; `adapters` holds the
//! implementations that ship with the crate.

pub mod api;
pub mod dom;
pub mod geolocation;
pub mod map;
pub mod time;

use std::future::Future;
use std::pin::Pin;

pub use api::{CentersApi, NotificationApi, SearchApi};
pub use dom::{Dom, Target};
pub use geolocation::{Geolocator, PositionOptions};
pub use map::{MapBackend, MapSurface, MapView, MarkerIcon, MarkerId, MarkerSpec};
pub use time::TimeProvider;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
