use crate::venue::{Venue, VenueInput};

pub const DEFAULT_FORM_LATITUDE: &str = "21.0285";
pub const DEFAULT_FORM_LONGITUDE: &str = "105.8542";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    MissingName,
    InvalidLatitude,
    InvalidLongitude,
    InvalidCapacity,
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::MissingName => write!(f, "Name is required"),
            FormError::InvalidLatitude => write!(f, "Latitude must be a number"),
            FormError::InvalidLongitude => write!(f, "Longitude must be a number"),
            FormError::InvalidCapacity => write!(f, "Capacity must be a positive whole number"),
        }
    }
}

impl std::error::Error for FormError {}

/// Raw text of the admin venue form, one field per input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueForm {
    pub name: String,
    pub description: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    pub capacity: String,
    pub image_url: String,
}

impl Default for VenueForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            address: String::new(),
            latitude: DEFAULT_FORM_LATITUDE.to_string(),
            longitude: DEFAULT_FORM_LONGITUDE.to_string(),
            capacity: String::new(),
            image_url: String::new(),
        }
    }
}

impl VenueForm {
    pub fn from_venue(venue: &Venue) -> Self {
        Self {
            name: venue.name.clone(),
            description: venue.description.clone().unwrap_or_default(),
            address: venue.address.clone().unwrap_or_default(),
            latitude: venue.latitude.to_string(),
            longitude: venue.longitude.to_string(),
            capacity: venue.capacity.map(|c| c.to_string()).unwrap_or_default(),
            image_url: venue.image_url.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<VenueInput, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }
        let latitude = parse_coordinate(&self.latitude).ok_or(FormError::InvalidLatitude)?;
        let longitude = parse_coordinate(&self.longitude).ok_or(FormError::InvalidLongitude)?;
        let capacity = match self.capacity.trim() {
            "" => None,
            raw => Some(
                raw.parse::<u32>()
                    .ok()
                    .filter(|c| *c > 0)
                    .ok_or(FormError::InvalidCapacity)?,
            ),
        };

        Ok(VenueInput {
            name: name.to_string(),
            description: non_empty(&self.description),
            address: non_empty(&self.address),
            latitude,
            longitude,
            capacity,
            image_url: non_empty(&self.image_url),
        })
    }
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::fixture_venues;

    #[test]
    fn default_form_points_at_hanoi() {
        let form = VenueForm {
            name: "Hall".into(),
            ..VenueForm::default()
        };
        let input = form.validate().unwrap();
        assert_eq!(input.latitude, 21.0285);
        assert_eq!(input.longitude, 105.8542);
        assert_eq!(input.description, None);
        assert_eq!(input.capacity, None);
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(VenueForm::default().validate(), Err(FormError::MissingName));
    }

    #[test]
    fn coordinates_must_be_finite_numbers() {
        let mut form = VenueForm {
            name: "Hall".into(),
            latitude: "abc".into(),
            ..VenueForm::default()
        };
        assert_eq!(form.validate(), Err(FormError::InvalidLatitude));
        form.latitude = "21".into();
        form.longitude = "inf".into();
        assert_eq!(form.validate(), Err(FormError::InvalidLongitude));
    }

    #[test]
    fn capacity_must_be_positive() {
        let mut form = VenueForm {
            name: "Hall".into(),
            capacity: "0".into(),
            ..VenueForm::default()
        };
        assert_eq!(form.validate(), Err(FormError::InvalidCapacity));
        form.capacity = " 250 ".into();
        assert_eq!(form.validate().unwrap().capacity, Some(250));
    }

    #[test]
    fn from_venue_round_trips_through_validation() {
        let venue = &fixture_venues()[0];
        let input = VenueForm::from_venue(venue).validate().unwrap();
        assert_eq!(input.name, venue.name);
        assert_eq!(input.latitude, venue.latitude);
        assert_eq!(input.capacity, venue.capacity);
    }
}
