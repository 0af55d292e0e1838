use serde::{Deserialize, Serialize};

use crate::config::MapProvider;
use crate::geo::{LatLng, LatLngBounds};
use crate::markers::MarkerColor;
use crate::templates::Markup;

/// Center and zoom of a map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
}

/// Identifies a marker within one map instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerIcon {
    Center(MarkerColor),
    UserLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: LatLng,
    pub title: String,
    pub icon: MarkerIcon,
    pub popup: Option<Markup>,
}

/// A live map bound to one container element.
///
/// Markers belong to the surface that created them; ids from one surface
/// mean nothing to another.
pub trait MapSurface: Send + 'static {
    fn set_view(&mut self, view: MapView);
    /// Install the provider's base imagery.
    fn add_base_layer(&mut self);
    /// Create a marker and attach it to the map.
    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId;
    fn show_marker(&mut self, id: MarkerId);
    fn hide_marker(&mut self, id: MarkerId);
    /// Detach and destroy a marker.
    fn remove_marker(&mut self, id: MarkerId);
    fn fit_bounds(&mut self, bounds: LatLngBounds);
}

/// A mapping library the page can render with, chosen at startup.
pub trait MapBackend: Send + Sync + 'static {
    type Surface: MapSurface;

    fn provider(&self) -> MapProvider;
    fn open(&self, container_id: &str, view: MapView) -> Self::Surface;
}
