//! Markers for the centers currently on the map.
//!
//! The store keeps one marker per rendered center for the lifetime of a map
//! instance. Filtering only shows and hides markers, so a broader filter can
//! bring back hidden centers without fetching anything.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::geo::{LatLng, UserLocation, format_distance};
use crate::ports::{MapSurface, MapView, MarkerIcon, MarkerId, MarkerSpec};
use crate::templates::{CenterPopupTemplate, Markup, USER_POPUP_HTML};
use crate::types::Center;

pub(crate) const USER_LOCATION_ZOOM: u8 = 13;

/// Marker tint derived from a center's availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerColor {
    Green,
    Amber,
    Red,
}

impl MarkerColor {
    pub fn for_availability(percentage: f64) -> Self {
        if percentage >= 70.0 {
            MarkerColor::Green
        } else if percentage >= 40.0 {
            MarkerColor::Amber
        } else {
            MarkerColor::Red
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            MarkerColor::Green => "#28a745",
            MarkerColor::Amber => "#ffc107",
            MarkerColor::Red => "#dc3545",
        }
    }
}

/// Predicate deciding which centers are visible.
#[derive(Clone)]
pub struct CenterFilter {
    description: String,
    predicate: Arc<dyn Fn(&Center) -> bool + Send + Sync>,
}

impl CenterFilter {
    pub fn all() -> Self {
        Self {
            description: "all".to_string(),
            predicate: Arc::new(|_| true),
        }
    }

    pub fn new<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Center) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Centers accepting `material`; a blank value shows everything, matching
    /// the empty option of the material select.
    pub fn material(material: &str) -> Self {
        let material = material.trim().to_string();
        if material.is_empty() {
            return Self::all();
        }
        Self::new(format!("material={material}"), move |center| {
            center.accepts(&material)
        })
    }

    pub fn matches(&self, center: &Center) -> bool {
        (self.predicate)(center)
    }
}

impl Default for CenterFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for CenterFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CenterFilter").field(&self.description).finish()
    }
}

#[derive(Debug, Clone)]
struct TrackedMarker {
    center: Center,
    id: MarkerId,
    shown: bool,
}

#[derive(Debug, Default)]
pub struct MarkerStore {
    markers: Vec<TrackedMarker>,
    user_marker: Option<MarkerId>,
    filter: CenterFilter,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every center marker with one per entry of `centers`.
    ///
    /// Popups are built before anything is removed, so a rendering failure
    /// leaves the previous markers in place.
    pub fn render<S: MapSurface>(
        &mut self,
        map: &mut S,
        centers: &[Center],
        user: Option<UserLocation>,
    ) -> askama::Result<()> {
        let popups = centers
            .iter()
            .map(|center| center_popup(center, user))
            .collect::<askama::Result<Vec<_>>>()?;

        self.clear(map);
        for (center, popup) in centers.iter().zip(popups) {
            let id = map.add_marker(MarkerSpec {
                position: center.position(),
                title: center.name.clone(),
                icon: MarkerIcon::Center(MarkerColor::for_availability(
                    center.availability_percentage,
                )),
                popup: Some(popup),
            });
            let shown = self.filter.matches(center);
            if !shown {
                map.hide_marker(id);
            }
            self.markers.push(TrackedMarker {
                center: center.clone(),
                id,
                shown,
            });
        }
        tracing::debug!(
            total = self.markers.len(),
            visible = self.visible_count(),
            "rendered center markers"
        );
        Ok(())
    }

    /// Move the user marker to `location` and center the view on it.
    pub fn set_user_marker<S: MapSurface>(&mut self, map: &mut S, location: UserLocation) {
        if let Some(previous) = self.user_marker.take() {
            map.remove_marker(previous);
        }
        let id = map.add_marker(MarkerSpec {
            position: location,
            title: "Your Location".to_string(),
            icon: MarkerIcon::UserLocation,
            popup: Some(Markup::trusted(USER_POPUP_HTML)),
        });
        self.user_marker = Some(id);
        map.set_view(MapView {
            center: location,
            zoom: USER_LOCATION_ZOOM,
        });
    }

    /// Show markers whose center passes `filter`, hide the rest.
    pub fn filter<S: MapSurface>(&mut self, map: &mut S, filter: CenterFilter) {
        self.filter = filter;
        for marker in &mut self.markers {
            let shown = self.filter.matches(&marker.center);
            if shown == marker.shown {
                continue;
            }
            if shown {
                map.show_marker(marker.id);
            } else {
                map.hide_marker(marker.id);
            }
            marker.shown = shown;
        }
        tracing::debug!(
            filter = ?self.filter,
            visible = self.visible_count(),
            "applied center filter"
        );
    }

    /// Remove every center marker. The user marker stays.
    pub fn clear<S: MapSurface>(&mut self, map: &mut S) {
        for marker in self.markers.drain(..) {
            map.remove_marker(marker.id);
        }
    }

    /// Forget all markers without touching a map, for when the map itself is
    /// being discarded.
    pub(crate) fn forget(&mut self) {
        self.markers.clear();
        self.user_marker = None;
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn visible_count(&self) -> usize {
        self.markers.iter().filter(|marker| marker.shown).count()
    }

    fn visible_centers(&self) -> impl Iterator<Item = &Center> {
        self.markers
            .iter()
            .filter(|marker| marker.shown)
            .map(|marker| &marker.center)
    }

    pub fn visible_positions(&self) -> Vec<LatLng> {
        self.visible_centers().map(Center::position).collect()
    }

    pub fn user_marker(&self) -> Option<MarkerId> {
        self.user_marker
    }
}

fn center_popup(center: &Center, user: Option<UserLocation>) -> askama::Result<Markup> {
    let distance = user.map(|user| format_distance(user.distance_km_to(center.position())));
    Markup::render(&CenterPopupTemplate {
        name: &center.name,
        address: &center.address,
        phone_number: &center.phone_number,
        availability: format!("{:.0}", center.availability_percentage),
        distance,
        detail_url: center.detail_url(),
    })
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::adapters::scene::{SceneBackend, SceneMap};
    use crate::config::MapProvider;
    use crate::ports::MapBackend;

    fn open_map() -> SceneMap {
        SceneBackend::new(MapProvider::Leaflet).open(
            "center-map",
            MapView {
                center: LatLng::new(40.0, -74.0),
                zoom: 11,
            },
        )
    }

    fn centers() -> Vec<Center> {
        vec![
            Center::at(1, "Glass Yard", 40.71, -74.0).accepting(&["glass"]),
            Center::at(2, "Paper Mill", 40.72, -74.01).accepting(&["paper"]),
            Center::at(3, "All Sorts", 40.73, -74.02).accepting(&["glass", "paper", "metal"]),
        ]
    }

    #[test]
    fn marker_color__should_follow_availability_thresholds() {
        assert_eq!(MarkerColor::for_availability(100.0), MarkerColor::Green);
        assert_eq!(MarkerColor::for_availability(70.0), MarkerColor::Green);
        assert_eq!(MarkerColor::for_availability(69.0), MarkerColor::Amber);
        assert_eq!(MarkerColor::for_availability(40.0), MarkerColor::Amber);
        assert_eq!(MarkerColor::for_availability(39.0), MarkerColor::Red);
        assert_eq!(MarkerColor::for_availability(0.0), MarkerColor::Red);
    }

    #[test]
    fn render__should_create_one_marker_per_center() {
        // Given
        let mut map = open_map();
        let mut store = MarkerStore::new();
        let centers = vec![
            Center::at(1, "A", 40.71, -74.0).with_availability(85.0),
            Center::at(2, "B", 40.72, -74.0).with_availability(55.0),
            Center::at(3, "C", 40.73, -74.0).with_availability(10.0),
        ];

        // When
        store.render(&mut map, &centers, None).expect("render");

        // Then
        let scene = map.scene();
        assert_eq!(scene.markers.len(), 3);
        let icons: Vec<MarkerIcon> = scene.markers.iter().map(|m| m.icon).collect();
        assert_eq!(
            icons,
            vec![
                MarkerIcon::Center(MarkerColor::Green),
                MarkerIcon::Center(MarkerColor::Amber),
                MarkerIcon::Center(MarkerColor::Red),
            ]
        );
        assert!(scene.markers.iter().all(|m| m.visible));
    }

    #[test]
    fn render__should_replace_previous_markers() {
        // Given
        let mut map = open_map();
        let mut store = MarkerStore::new();
        store.render(&mut map, &centers(), None).expect("first render");

        // When
        store
            .render(&mut map, &centers()[..1], None)
            .expect("second render");

        // Then
        assert_eq!(map.scene().markers.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn render__should_add_distance_line_when_user_known() {
        // Given
        let mut map = open_map();
        let mut store = MarkerStore::new();
        let user = LatLng::new(40.71, -74.0);

        // When
        store
            .render(&mut map, &centers()[..1], Some(user))
            .expect("render");

        // Then
        let popup = map.scene().markers[0].popup.clone().expect("popup");
        assert!(popup.as_str().contains("Distance:"));
        assert!(popup.as_str().contains("0 m"));
    }

    #[test]
    fn filter__should_show_only_matching_markers_and_restore_on_broader_filter() {
        // Given
        let mut map = open_map();
        let mut store = MarkerStore::new();
        store.render(&mut map, &centers(), None).expect("render");

        // When
        store.filter(&mut map, CenterFilter::material("paper"));

        // Then
        assert_eq!(map.scene().visible_titles(), vec!["Paper Mill", "All Sorts"]);
        assert_eq!(store.visible_count(), 2);

        // When
        store.filter(&mut map, CenterFilter::material("metal"));

        // Then
        assert_eq!(map.scene().visible_titles(), vec!["All Sorts"]);

        // When
        store.filter(&mut map, CenterFilter::all());

        // Then
        assert_eq!(
            map.scene().visible_titles(),
            vec!["Glass Yard", "Paper Mill", "All Sorts"]
        );
        assert_eq!(map.scene().markers.len(), 3);
    }

    #[test]
    fn render__should_apply_current_filter_to_new_markers() {
        // Given
        let mut map = open_map();
        let mut store = MarkerStore::new();
        store.filter(&mut map, CenterFilter::material("glass"));

        // When
        store.render(&mut map, &centers(), None).expect("render");

        // Then
        assert_eq!(map.scene().visible_titles(), vec!["Glass Yard", "All Sorts"]);
    }

    #[test]
    fn set_user_marker__should_replace_previous_marker_and_recenter() {
        // Given
        let mut map = open_map();
        let mut store = MarkerStore::new();
        store.render(&mut map, &centers(), None).expect("render");

        // When
        store.set_user_marker(&mut map, LatLng::new(40.0, -73.0));
        store.set_user_marker(&mut map, LatLng::new(41.0, -72.0));

        // Then
        let scene = map.scene();
        let users: Vec<_> = scene
            .markers
            .iter()
            .filter(|m| m.icon == MarkerIcon::UserLocation)
            .collect();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].position, LatLng::new(41.0, -72.0));
        assert_eq!(scene.view.center, LatLng::new(41.0, -72.0));
        assert_eq!(scene.markers.len(), 4);
    }

    #[test]
    fn clear__should_keep_user_marker() {
        let mut map = open_map();
        let mut store = MarkerStore::new();
        store.render(&mut map, &centers(), None).expect("render");
        store.set_user_marker(&mut map, LatLng::new(40.0, -73.0));

        store.clear(&mut map);

        assert_eq!(map.scene().markers.len(), 1);
        assert!(store.user_marker().is_some());
        assert!(store.is_empty());
    }
}
