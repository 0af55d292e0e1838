//! Great-circle distance and display formatting.
//!
//! Coordinates are plain degrees. Nothing in here validates ranges; callers
//! hand over whatever the backend or the geolocation port produced.

use serde::{Deserialize, Serialize};

use crate::types::Center;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Distance to `other` in kilometers.
    pub fn distance_km_to(&self, other: LatLng) -> f64 {
        distance_km(self.lat, self.lng, other.lat, other.lng)
    }
}

impl std::str::FromStr for LatLng {
    type Err = String;

    /// Parses `"lat,lng"`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = raw
            .split_once(',')
            .ok_or_else(|| format!("invalid coordinate '{raw}'; expected <lat>,<lng>"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| format!("invalid latitude in '{raw}'"))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| format!("invalid longitude in '{raw}'"))?;
        Ok(Self { lat, lng })
    }
}

/// The location of the person using the page.
pub type UserLocation = LatLng;

/// Haversine distance between two points, in kilometers.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Render a distance for display: whole meters below one kilometer,
/// otherwise kilometers with one decimal.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", (km * 1000.0).round())
    } else {
        format!("{km:.1} km")
    }
}

/// Axis-aligned bounding box over a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    /// Smallest box containing every point, or `None` when there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self {
            south_west: first,
            north_east: first,
        };
        for point in points {
            bounds.extend(point);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
            lng: (self.south_west.lng + self.north_east.lng) / 2.0,
        }
    }
}

/// Order centers by distance from `origin`, closest first. Equal distances
/// keep their input order.
pub fn nearest_first(centers: &[Center], origin: LatLng) -> Vec<(Center, f64)> {
    let mut ranked: Vec<(Center, f64)> = centers
        .iter()
        .map(|center| (center.clone(), origin.distance_km_to(center.position())))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}
