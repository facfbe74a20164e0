use venuemap_shared::{BoundingBox, BoundsParamStyle, LatLng};

pub const DEFAULT_API_URL: &str = "/api";
pub const DEFAULT_BOUNDS_DEBOUNCE_MS: u32 = 400;
pub const DEFAULT_CLUSTER_RADIUS_PX: f64 = 80.0;

/// Initial fetch area around Hanoi, used before the map reports its viewport.
pub const DEFAULT_BOUNDS: BoundingBox = BoundingBox::new(21.15, 20.9, 106.0, 105.6);
pub const DEFAULT_MAP_CENTER: LatLng = LatLng::new(21.0285, 105.8542);
pub const DEFAULT_MAP_ZOOM: f64 = 12.0;

pub const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str =
    r#"&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a>"#;

/// Client settings baked in at build time. The wasm binary has no process
/// environment, so values come from `option_env!` when the crate is compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub use_mock: bool,
    pub bounds_debounce_ms: u32,
    pub bounds_params: BoundsParamStyle,
    pub cluster_markers: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            use_mock: false,
            bounds_debounce_ms: DEFAULT_BOUNDS_DEBOUNCE_MS,
            bounds_params: BoundsParamStyle::default(),
            cluster_markers: true,
        }
    }
}

impl ClientConfig {
    pub fn from_build_env() -> Self {
        Self::from_lookup(|key| match key {
            "VENUEMAP_API_URL" => option_env!("VENUEMAP_API_URL"),
            "VENUEMAP_USE_MOCK_DATA" => option_env!("VENUEMAP_USE_MOCK_DATA"),
            "VENUEMAP_BOUNDS_DEBOUNCE_MS" => option_env!("VENUEMAP_BOUNDS_DEBOUNCE_MS"),
            "VENUEMAP_BOUNDS_PARAMS" => option_env!("VENUEMAP_BOUNDS_PARAMS"),
            "VENUEMAP_CLUSTER_MARKERS" => option_env!("VENUEMAP_CLUSTER_MARKERS"),
            _ => None,
        })
    }

    pub fn from_lookup<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Self {
        let defaults = Self::default();
        Self {
            api_url: lookup("VENUEMAP_API_URL")
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.api_url),
            use_mock: lookup("VENUEMAP_USE_MOCK_DATA")
                .and_then(parse_flag)
                .unwrap_or(defaults.use_mock),
            bounds_debounce_ms: lookup("VENUEMAP_BOUNDS_DEBOUNCE_MS")
                .and_then(|value| value.trim().parse::<u32>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(defaults.bounds_debounce_ms),
            bounds_params: lookup("VENUEMAP_BOUNDS_PARAMS")
                .and_then(BoundsParamStyle::parse)
                .unwrap_or(defaults.bounds_params),
            cluster_markers: lookup("VENUEMAP_CLUSTER_MARKERS")
                .and_then(parse_flag)
                .unwrap_or(defaults.cluster_markers),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(ClientConfig::from_lookup(|_| None), ClientConfig::default());
    }

    #[test]
    fn reads_every_setting() {
        let config = ClientConfig::from_lookup(|key| match key {
            "VENUEMAP_API_URL" => Some("https://api.example.com/v1/"),
            "VENUEMAP_USE_MOCK_DATA" => Some("YES"),
            "VENUEMAP_BOUNDS_DEBOUNCE_MS" => Some("250"),
            "VENUEMAP_BOUNDS_PARAMS" => Some("cardinal"),
            "VENUEMAP_CLUSTER_MARKERS" => Some("off"),
            _ => None,
        });
        assert_eq!(config.api_url, "https://api.example.com/v1");
        assert!(config.use_mock);
        assert_eq!(config.bounds_debounce_ms, 250);
        assert_eq!(config.bounds_params, BoundsParamStyle::Cardinal);
        assert!(!config.cluster_markers);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = ClientConfig::from_lookup(|key| match key {
            "VENUEMAP_BOUNDS_DEBOUNCE_MS" => Some("0"),
            "VENUEMAP_USE_MOCK_DATA" => Some("maybe"),
            "VENUEMAP_API_URL" => Some("   "),
            _ => None,
        });
        assert_eq!(config.bounds_debounce_ms, DEFAULT_BOUNDS_DEBOUNCE_MS);
        assert!(!config.use_mock);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
