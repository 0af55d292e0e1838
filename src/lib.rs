//! Page layer of a recycling-center locator: center markers on a map,
//! distances to the user, toasts, notification polling, search-as-you-type
//! and form helpers.
//!
//! Controllers are written against the traits in [`ports`], so they run the
//! same against a browser bridge, the in-memory adapters used by the CLI, or
//! test fakes.

pub mod adapters;
pub mod config;
pub mod error;
pub mod forms;
pub mod geo;
pub mod map;
pub mod markers;
pub mod notifications;
pub mod page;
pub mod ports;
pub mod search;
pub mod templates;
pub mod toast;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use geo::{LatLng, distance_km, format_distance};
pub use map::MapController;
pub use markers::{CenterFilter, MarkerColor, MarkerStore};
pub use notifications::NotificationPoller;
pub use page::{EcoTracker, PageGlobals};
pub use search::SearchTypeahead;
pub use toast::{ToastKind, ToastQueue};
pub use types::Center;
