use serde::{Deserialize, Serialize};

use crate::jobs::Coords;

/// Every new provider starts with one five star rating so the average is
/// defined from day one.
const SEED_TOTAL_RATING: u32 = 5;
const SEED_RATING_COUNT: u32 = 1;

/// Aggregate statistics and reviews for a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    pub provider_id: String,
    pub name: String,
    #[serde(default)]
    pub coords: Option<Coords>,
    #[serde(default)]
    pub service_range_miles: Option<f64>,
    pub total_rating: u32,
    pub rating_count: u32,
    pub services_completed: u32,
    /// Formatted review strings, oldest first
    #[serde(default)]
    pub feedback: Vec<String>,
}

impl ProviderProfile {
    pub fn new(provider_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            name: name.into(),
            coords: None,
            service_range_miles: None,
            total_rating: SEED_TOTAL_RATING,
            rating_count: SEED_RATING_COUNT,
            services_completed: 0,
            feedback: Vec::new(),
        }
    }

    pub fn with_service_area(mut self, coords: Coords, range_miles: f64) -> Self {
        self.coords = Some(coords);
        self.service_range_miles = Some(range_miles);
        self
    }

    /// Mean rating, or `None` before any rating exists.
    pub fn average_rating(&self) -> Option<f64> {
        (self.rating_count > 0).then(|| f64::from(self.total_rating) / f64::from(self.rating_count))
    }
}
