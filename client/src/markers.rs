use std::collections::HashMap;
use std::f64::consts::PI;

use venuemap_shared::display::marker_popup_html;
use venuemap_shared::{BoundingBox, LatLng, Venue, VenueId};

const TILE_SIZE: f64 = 256.0;
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// One venue ready to be placed on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub id: VenueId,
    pub position: LatLng,
    pub popup_html: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub center: LatLng,
    /// Extent of the members, used to zoom in on click.
    pub bounds: BoundingBox,
    pub members: Vec<MarkerSpec>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn contains_selected(&self) -> bool {
        self.members.iter().any(|m| m.selected)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerGroup {
    Single(MarkerSpec),
    Cluster(Cluster),
}

/// Markers for every venue with finite coordinates, in input order.
/// Venues without a usable position are skipped, not reported.
pub fn marker_specs(venues: &[Venue], selected: Option<&str>) -> Vec<MarkerSpec> {
    venues
        .iter()
        .filter(|venue| venue.has_valid_coordinates())
        .map(|venue| MarkerSpec {
            id: venue.id.clone(),
            position: LatLng::new(venue.latitude, venue.longitude),
            popup_html: marker_popup_html(venue),
            selected: selected == Some(venue.id.as_str()),
        })
        .collect()
}

/// Web Mercator world pixel coordinates at `zoom`.
pub fn project(position: LatLng, zoom: f64) -> (f64, f64) {
    let world = TILE_SIZE * 2f64.powf(zoom);
    let lat = position.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let sin = lat.to_radians().sin();
    let x = (position.lng + 180.0) / 360.0 * world;
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)) * world;
    (x, y)
}

/// Group markers that fall in the same `cell_px` screen cell at `zoom`.
/// Groups are ordered by the first member's position in `specs`; a cell
/// holding a single marker yields [`MarkerGroup::Single`].
pub fn cluster(specs: Vec<MarkerSpec>, zoom: f64, cell_px: f64) -> Vec<MarkerGroup> {
    let cell_px = if cell_px > 0.0 { cell_px } else { 1.0 };
    let mut cells: HashMap<(i64, i64), usize> = HashMap::new();
    let mut buckets: Vec<Vec<MarkerSpec>> = Vec::new();

    for spec in specs {
        let (x, y) = project(spec.position, zoom);
        let cell = ((x / cell_px).floor() as i64, (y / cell_px).floor() as i64);
        match cells.get(&cell) {
            Some(&index) => buckets[index].push(spec),
            None => {
                cells.insert(cell, buckets.len());
                buckets.push(vec![spec]);
            }
        }
    }

    buckets.into_iter().map(into_group).collect()
}

fn into_group(mut members: Vec<MarkerSpec>) -> MarkerGroup {
    if members.len() == 1 {
        if let Some(single) = members.pop() {
            return MarkerGroup::Single(single);
        }
    }

    let n = members.len() as f64;
    let (mut north, mut south) = (f64::MIN, f64::MAX);
    let (mut east, mut west) = (f64::MIN, f64::MAX);
    let (mut lat_sum, mut lng_sum) = (0.0, 0.0);
    for m in &members {
        north = north.max(m.position.lat);
        south = south.min(m.position.lat);
        east = east.max(m.position.lng);
        west = west.min(m.position.lng);
        lat_sum += m.position.lat;
        lng_sum += m.position.lng;
    }

    MarkerGroup::Cluster(Cluster {
        center: LatLng::new(lat_sum / n, lng_sum / n),
        bounds: BoundingBox::new(north, south, east, west),
        members,
    })
}

/// Everything the marker layer draws for one render.
pub fn plan_markers(
    venues: &[Venue],
    selected: Option<&str>,
    zoom: Option<f64>,
    cell_px: Option<f64>,
) -> Vec<MarkerGroup> {
    let specs = marker_specs(venues, selected);
    match (zoom, cell_px) {
        (Some(zoom), Some(cell_px)) => cluster(specs, zoom, cell_px),
        _ => specs.into_iter().map(MarkerGroup::Single).collect(),
    }
}

/// CSS class list for a venue pin.
pub fn pin_class(selected: bool) -> &'static str {
    if selected {
        "venue-pin venue-pin--selected"
    } else {
        "venue-pin"
    }
}

/// Inner HTML for a cluster bubble, sized by member count.
pub fn cluster_icon_html(cluster: &Cluster) -> (String, f64) {
    let count = cluster.len();
    let (size, tier) = match count {
        0..=9 => (34.0, "small"),
        10..=99 => (40.0, "medium"),
        _ => (48.0, "large"),
    };
    let selected = if cluster.contains_selected() {
        " venue-cluster--selected"
    } else {
        ""
    };
    (
        format!(r#"<div class="venue-cluster venue-cluster--{tier}{selected}"><span>{count}</span></div>"#),
        size,
    )
}
