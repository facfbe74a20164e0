//! Bindings to the subset of the global Leaflet (`L`) API the venue map uses.
//! Leaflet is loaded by `index.html`; nothing here owns state.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use venuemap_shared::LatLng;

use crate::bounds_controller::ViewportSource;

#[wasm_bindgen]
extern "C" {
    #[derive(Clone)]
    pub type Map;
    pub type LatLngBounds;
    #[wasm_bindgen(js_name = LatLng)]
    pub type JsLatLng;
    pub type TileLayer;
    pub type LayerGroup;
    pub type Marker;
    pub type DivIcon;

    #[wasm_bindgen(js_namespace = L, js_name = map, catch)]
    pub fn create_map(container: &web_sys::HtmlElement, options: &JsValue) -> Result<Map, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    pub fn set_view(this: &Map, center: &JsValue, zoom: f64) -> Map;

    #[wasm_bindgen(method, js_name = fitBounds)]
    pub fn fit_bounds(this: &Map, bounds: &JsValue, options: &JsValue) -> Map;

    #[wasm_bindgen(method, js_name = getBounds, catch)]
    pub fn get_bounds(this: &Map) -> Result<LatLngBounds, JsValue>;

    #[wasm_bindgen(method, js_name = getZoom)]
    pub fn get_zoom(this: &Map) -> f64;

    #[wasm_bindgen(method, js_name = invalidateSize)]
    pub fn invalidate_size(this: &Map) -> Map;

    #[wasm_bindgen(method)]
    pub fn on(this: &Map, event: &str, handler: &js_sys::Function) -> Map;

    #[wasm_bindgen(method)]
    pub fn off(this: &Map, event: &str, handler: &js_sys::Function) -> Map;

    #[wasm_bindgen(method)]
    pub fn remove(this: &Map) -> Map;

    #[wasm_bindgen(method, js_name = getNorthEast)]
    pub fn get_north_east(this: &LatLngBounds) -> JsLatLng;

    #[wasm_bindgen(method, js_name = getSouthWest)]
    pub fn get_south_west(this: &LatLngBounds) -> JsLatLng;

    #[wasm_bindgen(method, getter)]
    pub fn lat(this: &JsLatLng) -> f64;

    #[wasm_bindgen(method, getter)]
    pub fn lng(this: &JsLatLng) -> f64;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    pub fn tile_layer(url: &str, options: &JsValue) -> TileLayer;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &TileLayer, map: &Map) -> TileLayer;

    #[wasm_bindgen(js_namespace = L, js_name = layerGroup)]
    pub fn layer_group() -> LayerGroup;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &LayerGroup, map: &Map) -> LayerGroup;

    #[wasm_bindgen(method, js_name = addLayer)]
    pub fn add_layer(this: &LayerGroup, marker: &Marker) -> LayerGroup;

    #[wasm_bindgen(method, js_name = clearLayers)]
    pub fn clear_layers(this: &LayerGroup) -> LayerGroup;

    #[wasm_bindgen(method, js_name = remove)]
    pub fn remove(this: &LayerGroup) -> LayerGroup;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    pub fn marker(position: &JsValue, options: &JsValue) -> Marker;

    #[wasm_bindgen(method)]
    pub fn on(this: &Marker, event: &str, handler: &js_sys::Function) -> Marker;

    #[wasm_bindgen(method, js_name = bindPopup)]
    pub fn bind_popup(this: &Marker, html: &str) -> Marker;

    #[wasm_bindgen(method, js_name = openPopup)]
    pub fn open_popup(this: &Marker) -> Marker;

    #[wasm_bindgen(js_namespace = L, js_name = divIcon)]
    pub fn div_icon(options: &JsValue) -> DivIcon;

    #[wasm_bindgen(js_namespace = ["L", "DomEvent"], js_name = stopPropagation)]
    pub fn stop_propagation(event: &JsValue);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    pub zoom_control: bool,
    pub scroll_wheel_zoom: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLayerOptions<'a> {
    pub attribution: &'a str,
    pub max_zoom: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivIconOptions<'a> {
    pub html: &'a str,
    pub class_name: &'a str,
    pub icon_size: [f64; 2],
    pub icon_anchor: [f64; 2],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitBoundsOptions {
    pub padding: [f64; 2],
    pub max_zoom: u8,
}

/// Serialize an options struct into a plain JS object.
pub fn options(value: &impl Serialize) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::UNDEFINED)
}

/// `[lat, lng]` array, accepted anywhere Leaflet takes a LatLng.
pub fn lat_lng(position: LatLng) -> JsValue {
    js_sys::Array::of2(&position.lat.into(), &position.lng.into()).into()
}

/// `[[south, west], [north, east]]`.
pub fn lat_lng_bounds(south_west: LatLng, north_east: LatLng) -> JsValue {
    js_sys::Array::of2(&lat_lng(south_west), &lat_lng(north_east)).into()
}

/// Marker options carrying a prebuilt icon and a z offset.
pub fn marker_options(icon: &DivIcon, z_offset: i32) -> JsValue {
    let options = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&options, &"icon".into(), icon);
    let _ = js_sys::Reflect::set(&options, &"zIndexOffset".into(), &z_offset.into());
    let _ = js_sys::Reflect::set(&options, &"riseOnHover".into(), &true.into());
    options.into()
}

fn finite(point: JsLatLng) -> Option<LatLng> {
    let position = LatLng::new(point.lat(), point.lng());
    position.is_finite().then_some(position)
}

impl ViewportSource for Map {
    fn north_east(&self) -> Option<LatLng> {
        finite(self.get_bounds().ok()?.get_north_east())
    }

    fn south_west(&self) -> Option<LatLng> {
        finite(self.get_bounds().ok()?.get_south_west())
    }
}
