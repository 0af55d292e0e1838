//! The page's single map and everything drawn on it.
//!
//! `MapController` owns the map surface, the marker store and the user's
//! last known position. Renders, filter changes and location fixes all go
//! through it, so they apply in the order the page issues them.

use std::time::Duration;

use time::OffsetDateTime;

use crate::config::MapConfig;
use crate::error::GeolocationError;
use crate::geo::{LatLng, LatLngBounds, UserLocation};
use crate::markers::{CenterFilter, MarkerStore};
use crate::ports::{
    Dom, Geolocator, MapBackend, MapSurface, MapView, PositionOptions, Target, TimeProvider,
};
use crate::types::Center;

const DATA_LAT: &str = "data-lat";
const DATA_LNG: &str = "data-lng";
const DATA_ZOOM: &str = "data-zoom";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fix {
    position: LatLng,
    at: OffsetDateTime,
}

/// A position lookup detached from the controller, so the page can wait on
/// it without blocking other map updates.
pub struct PositionRequest<G, T> {
    geolocator: G,
    time: T,
    options: PositionOptions,
    cached: Option<Fix>,
    generation: u64,
}

/// The answer to one `PositionRequest`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPosition {
    generation: u64,
    pub result: Result<LatLng, GeolocationError>,
}

impl<G, T> PositionRequest<G, T>
where
    G: Geolocator,
    T: TimeProvider,
{
    /// Resolve to a position: a cached fix younger than `maximum_age`, or a
    /// fresh one within `timeout`.
    pub async fn resolve(self) -> ResolvedPosition {
        let generation = self.generation;
        let result = if let Some(fix) = self.cached
            && age(self.time.now(), fix.at) <= self.options.maximum_age
        {
            tracing::debug!("using cached position");
            Ok(fix.position)
        } else {
            tokio::select! {
                result = self.geolocator.current_position(&self.options) => result,
                _ = self.time.sleep(self.options.timeout) => Err(GeolocationError::Timeout),
            }
        };
        ResolvedPosition { generation, result }
    }
}

fn age(now: OffsetDateTime, at: OffsetDateTime) -> Duration {
    (now - at).try_into().unwrap_or(Duration::ZERO)
}

pub struct MapController<B: MapBackend, G, D, T> {
    backend: B,
    geolocator: G,
    dom: D,
    time: T,
    config: MapConfig,
    position_options: PositionOptions,
    map: Option<B::Surface>,
    epoch: u64,
    markers: MarkerStore,
    centers: Vec<Center>,
    user_location: Option<UserLocation>,
    last_fix: Option<Fix>,
    lookup_generation: u64,
}

impl<B, G, D, T> MapController<B, G, D, T>
where
    B: MapBackend,
    G: Geolocator,
    D: Dom,
    T: TimeProvider,
{
    pub fn new(
        backend: B,
        geolocator: G,
        dom: D,
        time: T,
        config: MapConfig,
        position_options: PositionOptions,
    ) -> Self {
        Self {
            backend,
            geolocator,
            dom,
            time,
            config,
            position_options,
            map: None,
            epoch: 0,
            markers: MarkerStore::new(),
            centers: Vec::new(),
            user_location: None,
            last_fix: None,
            lookup_generation: 0,
        }
    }

    /// The map, created on first use from the container's `data-lat`,
    /// `data-lng` and `data-zoom` attributes. `None` when the page has no
    /// map container.
    pub fn ensure_map(&mut self) -> Option<&mut B::Surface> {
        if self.map.is_none() {
            let container = Target::id(self.config.container_id.as_str());
            if !self.dom.exists(&container) {
                tracing::debug!(container = %self.config.container_id, "no map container on page");
                return None;
            }
            let view = self.initial_view(&container);
            let mut surface = self.backend.open(&self.config.container_id, view);
            surface.add_base_layer();
            self.epoch += 1;
            tracing::info!(
                provider = ?self.backend.provider(),
                epoch = self.epoch,
                lat = view.center.lat,
                lng = view.center.lng,
                zoom = view.zoom,
                "map initialized"
            );
            self.map = Some(surface);
        }
        self.map.as_mut()
    }

    fn initial_view(&self, container: &Target) -> MapView {
        let coordinate = |name: &str| {
            self.dom
                .attribute(container, name)
                .and_then(|raw| raw.trim().parse::<f64>().ok())
        };
        let center = match (coordinate(DATA_LAT), coordinate(DATA_LNG)) {
            (Some(lat), Some(lng)) => LatLng::new(lat, lng),
            _ => self.config.fallback_center,
        };
        let zoom = self
            .dom
            .attribute(container, DATA_ZOOM)
            .and_then(|raw| raw.trim().parse::<u8>().ok())
            .unwrap_or(self.config.fallback_zoom);
        MapView { center, zoom }
    }

    /// Draw one marker per center, with distances when the user has been
    /// located. Without a user location the view fits the visible markers.
    pub fn render_centers(&mut self, centers: Vec<Center>) -> askama::Result<()> {
        self.centers = centers;
        self.redraw()
    }

    fn redraw(&mut self) -> askama::Result<()> {
        let Some(map) = self.map.as_mut() else {
            tracing::debug!("no map; skipping center render");
            return Ok(());
        };
        self.markers.render(map, &self.centers, self.user_location)?;
        if self.user_location.is_none()
            && let Some(bounds) = LatLngBounds::from_points(self.markers.visible_positions())
        {
            map.fit_bounds(bounds);
        }
        Ok(())
    }

    pub fn set_filter(&mut self, filter: CenterFilter) {
        match self.map.as_mut() {
            Some(map) => self.markers.filter(map, filter),
            None => tracing::debug!(?filter, "no map; skipping filter"),
        }
    }

    /// Show only centers accepting `material`; blank shows all.
    pub fn filter_by_material(&mut self, material: &str) {
        self.set_filter(CenterFilter::material(material));
    }

    /// Snapshot what a position lookup needs. Starting a lookup supersedes
    /// every lookup started before it.
    pub fn position_request(&mut self) -> PositionRequest<G, T> {
        self.lookup_generation += 1;
        PositionRequest {
            geolocator: self.geolocator.clone(),
            time: self.time.clone(),
            options: self.position_options,
            cached: self.last_fix,
            generation: self.lookup_generation,
        }
    }

    /// Apply the outcome of a position lookup. A fix moves the user marker and
    /// redraws centers with distances; a failure is shown to the user and
    /// changes nothing. Answers to superseded lookups are dropped silently.
    pub fn apply_position(
        &mut self,
        resolved: ResolvedPosition,
    ) -> Result<LatLng, GeolocationError> {
        if resolved.generation != self.lookup_generation {
            tracing::debug!(
                generation = resolved.generation,
                current = self.lookup_generation,
                "discarding superseded position"
            );
            return Err(GeolocationError::Superseded);
        }
        let location = match resolved.result {
            Ok(location) => location,
            Err(err) => {
                tracing::warn!(error = %err, "could not get user location");
                self.dom.alert(&err.to_string());
                return Err(err);
            }
        };
        self.last_fix = Some(Fix {
            position: location,
            at: self.time.now(),
        });
        self.user_location = Some(location);
        if let Some(map) = self.map.as_mut() {
            self.markers.set_user_marker(map, location);
        }
        if let Err(err) = self.redraw() {
            tracing::error!(error = %err, "failed to redraw centers with distances");
        }
        Ok(location)
    }

    /// Look up the user's position and apply it.
    pub async fn locate_user(&mut self) -> Result<LatLng, GeolocationError> {
        let resolved = self.position_request().resolve().await;
        self.apply_position(resolved)
    }

    /// Drop the map and its markers. The next `ensure_map` starts a new map.
    pub fn teardown(&mut self) {
        if self.map.take().is_some() {
            self.markers.forget();
            tracing::info!(epoch = self.epoch, "map torn down");
        }
    }

    pub fn map(&self) -> Option<&B::Surface> {
        self.map.as_ref()
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    pub fn centers(&self) -> &[Center] {
        &self.centers
    }

    pub fn user_location(&self) -> Option<UserLocation> {
        self.user_location
    }

    /// How many maps have been created so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
