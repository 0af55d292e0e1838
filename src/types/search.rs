use serde::{Deserialize, Serialize};

/// One row returned by a search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Kilometers from the requesting user, when the server knew the location.
    #[serde(default)]
    pub distance: Option<f64>,
}
