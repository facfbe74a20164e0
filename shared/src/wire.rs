//! Backend response shapes and their normalization into [`Venue`].
//!
//! Field table (raw → canonical, first present wins):
//!
//! | canonical     | raw fields                     |
//! |---------------|--------------------------------|
//! | `id`          | `id` (string or number)        |
//! | `latitude`    | `latitude`, `lat`              |
//! | `longitude`   | `longitude`, `lng`             |
//! | `image_url`   | `imageUrl`, `images[0]`        |
//! | `review_count`| `reviewCount`, `review_count`  |
//! | `price_range` | `priceRange`, `price_range`    |
//!
//! Numbers may arrive as JSON numbers or numeric strings. A coordinate that is
//! missing or unparseable becomes NaN, which keeps the venue in lists but off the map.

use serde::Deserialize;
use serde_json::Value;

use crate::venue::Venue;

#[derive(Debug, Clone, Deserialize)]
pub struct RawVenue {
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lng: Option<Value>,
    #[serde(default)]
    pub capacity: Option<Value>,
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default, rename = "reviewCount")]
    pub review_count_camel: Option<Value>,
    #[serde(default, rename = "review_count")]
    pub review_count_snake: Option<Value>,
    #[serde(default, rename = "priceRange")]
    pub price_range_camel: Option<Value>,
    #[serde(default, rename = "price_range")]
    pub price_range_snake: Option<Value>,
}

/// List response: a bare array or `{ "data": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VenueListPayload {
    List(Vec<RawVenue>),
    Envelope {
        #[serde(default)]
        data: Vec<RawVenue>,
    },
}

impl VenueListPayload {
    pub fn into_venues(self) -> Vec<Venue> {
        let raw = match self {
            Self::List(list) => list,
            Self::Envelope { data } => data,
        };
        raw.into_iter().map(RawVenue::into_venue).collect()
    }
}

/// Single-record response: `{ "data": {...} }` or the bare record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VenuePayload {
    Envelope { data: RawVenue },
    Record(RawVenue),
}

impl VenuePayload {
    pub fn into_venue(self) -> Venue {
        match self {
            Self::Envelope { data } => data.into_venue(),
            Self::Record(raw) => raw.into_venue(),
        }
    }
}

fn number_from(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// First present value wins; a present-but-null field falls through.
fn first_number(primary: &Option<Value>, fallback: &Option<Value>) -> Option<f64> {
    let primary = primary.as_ref().filter(|v| !v.is_null());
    let fallback = fallback.as_ref().filter(|v| !v.is_null());
    match primary {
        Some(value) => number_from(Some(value)),
        None => number_from(fallback),
    }
}

fn count_from(value: Option<f64>) -> Option<u32> {
    value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round().min(u32::MAX as f64) as u32)
}

impl RawVenue {
    pub fn into_venue(self) -> Venue {
        let id = match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let latitude = first_number(&self.latitude, &self.lat).unwrap_or(f64::NAN);
        let longitude = first_number(&self.longitude, &self.lng).unwrap_or(f64::NAN);
        let review_count = count_from(first_number(
            &self.review_count_camel,
            &self.review_count_snake,
        ));
        let price_range = count_from(first_number(
            &self.price_range_camel,
            &self.price_range_snake,
        ))
        .map(|p| p.min(u8::MAX as u32) as u8);
        let image_url = self
            .image_url
            .or_else(|| self.images.and_then(|images| images.into_iter().next()));

        Venue {
            id,
            name: self.name.unwrap_or_default(),
            description: self.description,
            address: self.address,
            latitude,
            longitude,
            capacity: count_from(number_from(self.capacity.as_ref())),
            image_url,
            category: self.category,
            rating: number_from(self.rating.as_ref()).filter(|r| r.is_finite()),
            review_count,
            price_range,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Decode a list response body.
pub fn parse_venue_list(body: &str) -> Result<Vec<Venue>, serde_json::Error> {
    serde_json::from_str::<VenueListPayload>(body).map(VenueListPayload::into_venues)
}

/// Decode a single-venue response body.
pub fn parse_venue(body: &str) -> Result<Venue, serde_json::Error> {
    serde_json::from_str::<VenuePayload>(body).map(VenuePayload::into_venue)
}

/// Pull a human-readable `message` out of an error response body, if any.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_bare_array() {
        let body = json!([
            { "id": "a", "name": "A", "latitude": 21.0, "longitude": 105.8 },
            { "id": "b", "name": "B", "lat": 21.1, "lng": 105.9 }
        ])
        .to_string();
        let venues = parse_venue_list(&body).unwrap();
        assert_eq!(venues.len(), 2);
        assert_eq!(venues[1].latitude, 21.1);
        assert_eq!(venues[1].longitude, 105.9);
    }

    #[test]
    fn accepts_data_envelope() {
        let body = json!({ "data": [{ "id": 7, "name": "Seven", "lat": 1, "lng": 2 }] }).to_string();
        let venues = parse_venue_list(&body).unwrap();
        assert_eq!(venues[0].id, "7");
        assert_eq!(venues[0].latitude, 1.0);
    }

    #[test]
    fn envelope_without_data_is_empty() {
        assert!(parse_venue_list("{}").unwrap().is_empty());
    }

    #[test]
    fn camel_case_wins_over_snake_case() {
        let body = json!([{
            "id": "a",
            "name": "A",
            "latitude": 1.0,
            "longitude": 2.0,
            "reviewCount": 12,
            "review_count": 99,
            "priceRange": 3,
            "price_range": 1
        }])
        .to_string();
        let venue = &parse_venue_list(&body).unwrap()[0];
        assert_eq!(venue.review_count, Some(12));
        assert_eq!(venue.price_range, Some(3));
    }

    #[test]
    fn snake_case_used_when_camel_missing_or_null() {
        let body = json!([{
            "id": "a",
            "name": "A",
            "latitude": null,
            "lat": 5.5,
            "lng": "6.25",
            "review_count": 4,
            "price_range": "2"
        }])
        .to_string();
        let venue = &parse_venue_list(&body).unwrap()[0];
        assert_eq!(venue.latitude, 5.5);
        assert_eq!(venue.longitude, 6.25);
        assert_eq!(venue.review_count, Some(4));
        assert_eq!(venue.price_range, Some(2));
    }

    #[test]
    fn missing_or_garbage_coordinates_become_nan() {
        let body = json!([{ "id": "a", "name": "A", "latitude": "north-ish" }]).to_string();
        let venue = &parse_venue_list(&body).unwrap()[0];
        assert!(venue.latitude.is_nan());
        assert!(venue.longitude.is_nan());
        assert!(!venue.has_valid_coordinates());
    }

    #[test]
    fn image_falls_back_to_first_image() {
        let body = json!({ "id": "a", "name": "A", "lat": 0, "lng": 0, "images": ["x.png", "y.png"] })
            .to_string();
        assert_eq!(parse_venue(&body).unwrap().image_url.as_deref(), Some("x.png"));
    }

    #[test]
    fn single_record_accepts_envelope() {
        let body = json!({ "data": { "id": "a", "name": "A", "lat": 1, "lng": 2 } }).to_string();
        assert_eq!(parse_venue(&body).unwrap().id, "a");
    }

    #[test]
    fn rejects_non_venue_body() {
        assert!(parse_venue_list("\"nope\"").is_err());
        assert!(parse_venue_list("not json").is_err());
    }

    #[test]
    fn error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"message":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(error_message(r#"{"error":"boom"}"#).as_deref(), Some("boom"));
        assert_eq!(error_message("<html>"), None);
    }
}
