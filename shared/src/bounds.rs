use serde::{Deserialize, Serialize};

/// A `{lat, lng}` pair as reported by the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Rectangular geographic extent in degrees.
///
/// Values produced by [`BoundingBox::from_corners`] always satisfy
/// `south <= north` and `west <= east`. Antimeridian wraparound is not handled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub const fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Normalize a viewport's northeast/southwest corners.
    /// Returns `None` when either corner is not a finite coordinate.
    pub fn from_corners(north_east: LatLng, south_west: LatLng) -> Option<Self> {
        if !north_east.is_finite() || !south_west.is_finite() {
            return None;
        }
        Some(Self {
            north: north_east.lat.max(south_west.lat),
            south: north_east.lat.min(south_west.lat),
            east: north_east.lng.max(south_west.lng),
            west: north_east.lng.min(south_west.lng),
        })
    }

    /// Inclusive containment test. Non-finite coordinates are never contained.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south && lat <= self.north && lng >= self.west && lng <= self.east
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    /// Bit-exact key for hashing. `-0.0` folds into `0.0`.
    pub fn key(&self) -> BoundsKey {
        BoundsKey([
            canonical_bits(self.north),
            canonical_bits(self.south),
            canonical_bits(self.east),
            canonical_bits(self.west),
        ])
    }

    /// Four query parameters in the requested naming convention.
    pub fn query_params(&self, style: BoundsParamStyle) -> [(&'static str, String); 4] {
        match style {
            BoundsParamStyle::MinMax => [
                ("min_lat", self.south.to_string()),
                ("max_lat", self.north.to_string()),
                ("min_lng", self.west.to_string()),
                ("max_lng", self.east.to_string()),
            ],
            BoundsParamStyle::Cardinal => [
                ("north", self.north.to_string()),
                ("south", self.south.to_string()),
                ("east", self.east.to_string()),
                ("west", self.west.to_string()),
            ],
        }
    }
}

fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 { 0.0f64.to_bits() } else { value.to_bits() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundsKey([u64; 4]);

/// Naming convention for bounds query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsParamStyle {
    /// `min_lat`, `max_lat`, `min_lng`, `max_lng`
    #[default]
    MinMax,
    /// `north`, `south`, `east`, `west`
    Cardinal,
}

impl BoundsParamStyle {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "minmax" | "min_max" => Some(Self::MinMax),
            "cardinal" | "nsew" => Some(Self::Cardinal),
            _ => None,
        }
    }
}

/// What a venue query should fetch.
///
/// `Disabled` is distinct from `All`: no request is issued at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryTarget {
    Disabled,
    All,
    Within(BoundingBox),
}

impl QueryTarget {
    pub fn key(&self) -> Option<QueryKey> {
        match self {
            Self::Disabled => None,
            Self::All => Some(QueryKey::All),
            Self::Within(bounds) => Some(QueryKey::Bounds(bounds.key())),
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            Self::Within(bounds) => Some(*bounds),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKey {
    All,
    Bounds(BoundsKey),
}
