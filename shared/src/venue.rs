use serde::{Deserialize, Serialize};

use crate::bounds::BoundingBox;

pub type VenueId = String;

/// Canonical venue record. Every response shape is normalized into this at
/// the data-source boundary (see [`crate::wire`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Venue {
    /// Both coordinates are finite numbers, so the venue can be placed on the map.
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    pub fn is_within(&self, bounds: &BoundingBox) -> bool {
        bounds.contains(self.latitude, self.longitude)
    }
}

/// Keep only venues whose coordinates lie inside `bounds` (inclusive).
/// `None` returns every venue.
pub fn filter_within(venues: &[Venue], bounds: Option<&BoundingBox>) -> Vec<Venue> {
    match bounds {
        None => venues.to_vec(),
        Some(bounds) => venues
            .iter()
            .filter(|venue| venue.is_within(bounds))
            .cloned()
            .collect(),
    }
}

/// Fields submitted when creating a venue. The server assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl VenueInput {
    pub fn into_update(self, id: VenueId) -> VenueUpdate {
        VenueUpdate {
            id,
            name: Some(self.name),
            description: self.description,
            address: self.address,
            latitude: Some(self.latitude),
            longitude: Some(self.longitude),
            capacity: self.capacity,
            image_url: self.image_url,
        }
    }
}

/// Partial update. `id` travels in the URL, never in the body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueUpdate {
    #[serde(skip)]
    pub id: VenueId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl VenueUpdate {
    /// Overlay the present fields onto `venue`.
    pub fn apply_to(&self, venue: &mut Venue) {
        if let Some(name) = &self.name {
            venue.name = name.clone();
        }
        if let Some(description) = &self.description {
            venue.description = Some(description.clone());
        }
        if let Some(address) = &self.address {
            venue.address = Some(address.clone());
        }
        if let Some(latitude) = self.latitude {
            venue.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            venue.longitude = longitude;
        }
        if let Some(capacity) = self.capacity {
            venue.capacity = Some(capacity);
        }
        if let Some(image_url) = &self.image_url {
            venue.image_url = Some(image_url.clone());
        }
    }
}
