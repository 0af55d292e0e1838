//! Map surfaces that record their state as a serializable scene.
//!
//! The host page replays a [`MapScene`] with the library named by its
//! provider; the provider decides base imagery and how icons are encoded.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

use crate::config::MapProvider;
use crate::geo::{LatLng, LatLngBounds};
use crate::markers::MarkerColor;
use crate::ports::{MapBackend, MapSurface, MapView, MarkerIcon, MarkerId, MarkerSpec};
use crate::templates::Markup;

const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const OSM_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";
const OSM_MAX_ZOOM: u8 = 19;
const USER_MARKER_HEX: &str = "#007bff";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub url_template: String,
    pub max_zoom: u8,
    pub attribution: String,
}

/// How the host should draw a marker icon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IconSpec {
    /// Leaflet `divIcon` markup.
    Html { html: String, size: u32 },
    /// Image URL, scaled to `size` pixels.
    Url { url: String, size: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneMarker {
    pub id: MarkerId,
    pub position: LatLng,
    pub title: String,
    pub icon: MarkerIcon,
    pub icon_spec: IconSpec,
    pub popup: Option<Markup>,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapScene {
    pub provider: MapProvider,
    pub container_id: String,
    pub view: MapView,
    pub base_layer: Option<TileLayer>,
    pub hide_poi_labels: bool,
    pub fitted_bounds: Option<LatLngBounds>,
    pub markers: Vec<SceneMarker>,
}

impl MapScene {
    pub fn visible_titles(&self) -> Vec<&str> {
        self.markers
            .iter()
            .filter(|marker| marker.visible)
            .map(|marker| marker.title.as_str())
            .collect()
    }

    fn marker_mut(&mut self, id: MarkerId) -> Option<&mut SceneMarker> {
        self.markers.iter_mut().find(|marker| marker.id == id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SceneBackend {
    provider: MapProvider,
}

impl SceneBackend {
    pub fn new(provider: MapProvider) -> Self {
        Self { provider }
    }
}

impl MapBackend for SceneBackend {
    type Surface = SceneMap;

    fn provider(&self) -> MapProvider {
        self.provider
    }

    fn open(&self, container_id: &str, view: MapView) -> SceneMap {
        SceneMap {
            scene: MapScene {
                provider: self.provider,
                container_id: container_id.to_string(),
                view,
                base_layer: None,
                hide_poi_labels: false,
                fitted_bounds: None,
                markers: Vec::new(),
            },
            next_id: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneMap {
    scene: MapScene,
    next_id: u64,
}

impl SceneMap {
    pub fn scene(&self) -> &MapScene {
        &self.scene
    }
}

impl MapSurface for SceneMap {
    fn set_view(&mut self, view: MapView) {
        self.scene.view = view;
    }

    fn add_base_layer(&mut self) {
        match self.scene.provider {
            MapProvider::Leaflet => {
                self.scene.base_layer = Some(TileLayer {
                    url_template: OSM_TILE_URL.to_string(),
                    max_zoom: OSM_MAX_ZOOM,
                    attribution: OSM_ATTRIBUTION.to_string(),
                });
            }
            MapProvider::GoogleMaps => {
                self.scene.hide_poi_labels = true;
            }
        }
    }

    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.scene.markers.push(SceneMarker {
            id,
            position: spec.position,
            title: spec.title,
            icon: spec.icon,
            icon_spec: icon_spec(self.scene.provider, spec.icon),
            popup: spec.popup,
            visible: true,
        });
        id
    }

    fn show_marker(&mut self, id: MarkerId) {
        if let Some(marker) = self.scene.marker_mut(id) {
            marker.visible = true;
        }
    }

    fn hide_marker(&mut self, id: MarkerId) {
        if let Some(marker) = self.scene.marker_mut(id) {
            marker.visible = false;
        }
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.scene.markers.retain(|marker| marker.id != id);
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds) {
        self.scene.fitted_bounds = Some(bounds);
        self.scene.view.center = bounds.center();
    }
}

fn icon_spec(provider: MapProvider, icon: MarkerIcon) -> IconSpec {
    match (provider, icon) {
        (MapProvider::Leaflet, MarkerIcon::Center(color)) => IconSpec::Html {
            html: format!(
                r#"<div class="center-marker" style="background-color: {};"><i class="fas fa-recycle"></i></div>"#,
                color.hex()
            ),
            size: 30,
        },
        (MapProvider::Leaflet, MarkerIcon::UserLocation) => IconSpec::Html {
            html: format!(
                r#"<div class="user-location-marker" style="background-color: {USER_MARKER_HEX};"></div>"#
            ),
            size: 20,
        },
        (MapProvider::GoogleMaps, MarkerIcon::Center(color)) => IconSpec::Url {
            url: svg_data_url(&center_svg(color)),
            size: 32,
        },
        (MapProvider::GoogleMaps, MarkerIcon::UserLocation) => IconSpec::Url {
            url: svg_data_url(&format!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24"><circle cx="12" cy="12" r="8" fill="{USER_MARKER_HEX}" stroke="#fff" stroke-width="2"/></svg>"##
            )),
            size: 24,
        },
    }
}

fn center_svg(color: MarkerColor) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="32" viewBox="0 0 32 32"><circle cx="16" cy="16" r="12" fill="{}" stroke="#fff" stroke-width="2"/><text x="16" y="20" text-anchor="middle" fill="white" font-size="16">♻</text></svg>"##,
        color.hex()
    )
}

fn svg_data_url(svg: &str) -> String {
    format!(
        "data:image/svg+xml;charset=UTF-8,{}",
        utf8_percent_encode(svg, NON_ALPHANUMERIC)
    )
}
