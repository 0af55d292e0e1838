use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::geo::LatLng;

/// Material types a center can accept, as `(value, label)` pairs in the order
/// the filter select lists them.
pub const MATERIAL_TYPES: &[(&str, &str)] = &[
    ("plastic", "Plastic"),
    ("glass", "Glass"),
    ("paper", "Paper"),
    ("metal", "Metal"),
    ("electronic", "Electronic"),
    ("organic", "Organic"),
    ("textile", "Textile"),
    ("battery", "Battery"),
    ("other", "Other"),
];

pub fn material_label(value: &str) -> Option<&'static str> {
    MATERIAL_TYPES
        .iter()
        .find(|(material, _)| *material == value)
        .map(|(_, label)| *label)
}

/// A recycling center as supplied by the backend for one page load.
///
/// The page never mutates a center; markers and popups are re-rendered from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub id: u64,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub availability_percentage: f64,
    #[serde(default)]
    pub accepted_materials: BTreeSet<String>,
}

impl Center {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn accepts(&self, material: &str) -> bool {
        self.accepted_materials.contains(material)
    }

    pub fn detail_url(&self) -> String {
        format!("/centers/{}/", self.id)
    }

    #[cfg(test)]
    pub(crate) fn at(id: u64, name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            address: format!("{id} Test Street"),
            phone_number: "555-0100".to_string(),
            latitude,
            longitude,
            availability_percentage: 80.0,
            accepted_materials: BTreeSet::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn accepting(mut self, materials: &[&str]) -> Self {
        self.accepted_materials = materials.iter().map(|m| m.to_string()).collect();
        self
    }

    #[cfg(test)]
    pub(crate) fn with_availability(mut self, availability: f64) -> Self {
        self.availability_percentage = availability;
        self
    }
}
