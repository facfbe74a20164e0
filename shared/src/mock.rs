use crate::bounds::BoundingBox;
use crate::venue::{Venue, VenueId, VenueInput, VenueUpdate, filter_within};

/// Built-in fixtures: (id, name, address, lat, lng, capacity, category, rating, reviews, price).
const FIXTURES: &[(&str, &str, &str, f64, f64, u32, &str, f64, u32, u8)] = &[
    (
        "hn-001",
        "Hanoi Opera House",
        "1 Trang Tien, Hoan Kiem, Hanoi",
        21.0245,
        105.8575,
        600,
        "Theatre",
        4.8,
        2310,
        4,
    ),
    (
        "hn-002",
        "Lotte Center Ballroom",
        "54 Lieu Giai, Ba Dinh, Hanoi",
        21.0320,
        105.8124,
        900,
        "Ballroom",
        4.5,
        812,
        4,
    ),
    (
        "hn-003",
        "West Lake Garden Pavilion",
        "Xuan Dieu, Tay Ho, Hanoi",
        21.0634,
        105.8286,
        250,
        "Function Venue",
        4.3,
        164,
        3,
    ),
    (
        "hn-004",
        "Old Quarter Rooftop",
        "22 Hang Bac, Hoan Kiem, Hanoi",
        21.0341,
        105.8522,
        120,
        "Rooftop Bar",
        4.1,
        95,
        2,
    ),
    (
        "hn-005",
        "National Convention Center",
        "Pham Hung, Nam Tu Liem, Hanoi",
        21.0065,
        105.7873,
        3500,
        "Convention Center",
        4.6,
        1402,
        3,
    ),
    (
        "hn-006",
        "Long Bien Riverside Hall",
        "Ngoc Thuy, Long Bien, Hanoi",
        21.0512,
        105.8668,
        300,
        "Function Venue",
        3.9,
        58,
        2,
    ),
    (
        "hcm-001",
        "Saigon Riverside Hotel",
        "Ton Duc Thang, District 1, Ho Chi Minh City",
        10.7769,
        106.7059,
        450,
        "Hotel",
        4.4,
        980,
        4,
    ),
    (
        "dn-001",
        "Dragon Bridge Terrace",
        "Bach Dang, Hai Chau, Da Nang",
        16.0612,
        108.2277,
        200,
        "Function Venue",
        4.2,
        310,
        2,
    ),
];

pub fn fixture_venues() -> Vec<Venue> {
    FIXTURES
        .iter()
        .map(
            |&(id, name, address, latitude, longitude, capacity, category, rating, reviews, price)| {
                Venue {
                    id: id.to_string(),
                    name: name.to_string(),
                    description: Some(format!("{category} in {address}")),
                    address: Some(address.to_string()),
                    latitude,
                    longitude,
                    capacity: Some(capacity),
                    image_url: None,
                    category: Some(category.to_string()),
                    rating: Some(rating),
                    review_count: Some(reviews),
                    price_range: Some(price),
                    created_at: Some("2024-01-15T08:00:00Z".to_string()),
                    updated_at: Some("2024-01-15T08:00:00Z".to_string()),
                }
            },
        )
        .collect()
}

/// In-memory backend that answers every data-source operation from a fixture list.
#[derive(Debug, Clone)]
pub struct MockVenues {
    venues: Vec<Venue>,
}

impl Default for MockVenues {
    fn default() -> Self {
        Self::new(fixture_venues())
    }
}

impl MockVenues {
    pub fn new(venues: Vec<Venue>) -> Self {
        Self { venues }
    }

    pub fn all(&self, bounds: Option<&BoundingBox>) -> Vec<Venue> {
        filter_within(&self.venues, bounds)
    }

    pub fn by_id(&self, id: &str) -> Option<Venue> {
        self.venues.iter().find(|v| v.id == id).cloned()
    }

    /// Echo the input back as a new venue. Fixtures are not mutated.
    pub fn create(&self, input: VenueInput, now: chrono::DateTime<chrono::Utc>) -> Venue {
        let stamp = now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        Venue {
            id: mock_id(now.timestamp_millis()),
            name: input.name,
            description: input.description,
            address: input.address,
            latitude: input.latitude,
            longitude: input.longitude,
            capacity: input.capacity,
            image_url: input.image_url,
            category: None,
            rating: None,
            review_count: None,
            price_range: None,
            created_at: Some(stamp.clone()),
            updated_at: Some(stamp),
        }
    }

    /// Merge `update` onto the matching fixture. Fixtures are not mutated.
    pub fn update(&self, update: &VenueUpdate, now: chrono::DateTime<chrono::Utc>) -> Option<Venue> {
        let mut venue = self.by_id(&update.id)?;
        update.apply_to(&mut venue);
        venue.updated_at = Some(now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true));
        Some(venue)
    }
}

pub fn mock_id(millis: i64) -> VenueId {
    format!("mock-{millis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANOI: BoundingBox = BoundingBox::new(21.15, 20.9, 106.0, 105.6);

    fn at(id: &str, latitude: f64, longitude: f64) -> Venue {
        let mut venue = fixture_venues()[0].clone();
        venue.id = id.to_string();
        venue.latitude = latitude;
        venue.longitude = longitude;
        venue
    }

    #[test]
    fn fixture_ids_are_unique() {
        let venues = fixture_venues();
        let mut ids: Vec<&str> = venues.iter().map(|v| v.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), venues.len());
    }

    #[test]
    fn hanoi_bounds_select_hanoi_fixtures() {
        let mock = MockVenues::default();
        let venues = mock.all(Some(&HANOI));
        assert_eq!(venues.len(), 6);
        assert!(venues.iter().all(|v| v.id.starts_with("hn-")));
    }

    #[test]
    fn three_inside_two_outside() {
        let mock = MockVenues::new(vec![
            at("a", 21.0, 105.8),
            at("b", 21.1, 105.9),
            at("c", 20.95, 105.65),
            at("d", 10.77, 106.7),
            at("e", 16.06, 108.2),
        ]);
        assert_eq!(mock.all(Some(&HANOI)).len(), 3);
        assert!(
            mock.all(Some(&BoundingBox::new(-30.0, -40.0, 10.0, 0.0)))
                .is_empty()
        );
        assert_eq!(mock.all(None).len(), 5);
    }

    #[test]
    fn create_assigns_mock_id_and_timestamps() {
        let now = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let venue = MockVenues::default().create(
            VenueInput {
                name: "New".into(),
                description: None,
                address: None,
                latitude: 21.0,
                longitude: 105.8,
                capacity: Some(10),
                image_url: None,
            },
            now,
        );
        assert_eq!(venue.id, "mock-1700000000000");
        assert_eq!(venue.created_at, venue.updated_at);
        assert!(venue.created_at.unwrap().starts_with("2023-11-14T22:13:20"));
    }

    #[test]
    fn update_unknown_id_is_none() {
        let now = chrono::Utc::now();
        let update = VenueUpdate {
            id: "missing".into(),
            ..VenueUpdate::default()
        };
        assert!(MockVenues::default().update(&update, now).is_none());
    }

    #[test]
    fn update_merges_and_touches_timestamp() {
        let now = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let update = VenueUpdate {
            id: "hn-001".into(),
            name: Some("Opera".into()),
            ..VenueUpdate::default()
        };
        let venue = MockVenues::default().update(&update, now).unwrap();
        assert_eq!(venue.name, "Opera");
        assert_eq!(venue.address.as_deref(), Some("1 Trang Tien, Hoan Kiem, Hanoi"));
        assert_ne!(venue.updated_at, venue.created_at);
    }
}
