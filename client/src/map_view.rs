use leptos::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

use gloo_timers::callback::Timeout;
use venuemap_shared::{BoundingBox, LatLng, Venue};

use crate::bounds_controller::BoundsController;
use crate::config::{
    ClientConfig, DEFAULT_CLUSTER_RADIUS_PX, DEFAULT_MAP_CENTER, DEFAULT_MAP_ZOOM,
    TILE_ATTRIBUTION, TILE_URL,
};
use crate::debounce::DeadlineTimer;
use crate::leaflet::{self, DivIconOptions, FitBoundsOptions, MapOptions, TileLayerOptions};
use crate::log;
use crate::markers::{Cluster, MarkerGroup, MarkerSpec, cluster_icon_html, pin_class, plan_markers};
use crate::selection::Selected;

const PIN_SIZE: f64 = 26.0;
const SELECTED_PIN_SIZE: f64 = 36.0;
const CLUSTER_FIT_PADDING: [f64; 2] = [40.0, 40.0];
const CLUSTER_FIT_MAX_ZOOM: u8 = 18;

type EventHandler = Closure<dyn Fn(JsValue)>;

/// Everything the mounted Leaflet map owns. Dropped on teardown.
struct MapBinding {
    map: leaflet::Map,
    markers: leaflet::LayerGroup,
    controller: Rc<RefCell<BoundsController>>,
    timer: DeadlineTimer,
    initial_emit: Option<Timeout>,
    on_settled: EventHandler,
    on_map_click: EventHandler,
    marker_handlers: Vec<EventHandler>,
    last_selected: Option<String>,
}

thread_local! {
    static MAP_BINDING: RefCell<Option<MapBinding>> = const { RefCell::new(None) };
}

/// Interactive venue map. Reports its settled viewport through `on_bounds`
/// and mirrors the shared selection onto its markers. A new `on_bounds`
/// takes over any pending emission without restarting its countdown.
#[component]
pub fn VenueMap(
    #[prop(into)] venues: Signal<Vec<Venue>>,
    #[prop(into)] on_bounds: Signal<Callback<BoundingBox>>,
) -> impl IntoView {
    let config: ClientConfig = expect_context();
    let selected: Selected = expect_context();
    let container = NodeRef::<leptos::html::Div>::new();
    // `None` until the map is mounted; doubles as the recluster trigger.
    let zoom: RwSignal<Option<f64>> = RwSignal::new(None);
    let cluster_cell = config.cluster_markers.then_some(DEFAULT_CLUSTER_RADIUS_PX);

    Effect::new({
        let config = config.clone();
        move || {
            let Some(element) = container.get() else {
                return;
            };
            if MAP_BINDING.with(|slot| slot.borrow().is_some()) {
                return;
            }
            let callback = on_bounds.get_untracked();
            if let Err(err) = mount_map(&element, &config, callback, zoom, selected) {
                log::warn(&format!("map init failed: {err:?}"));
            }
        }
    });

    let delay_ms = config.bounds_debounce_ms;
    Effect::new(move || {
        let callback = on_bounds.get();
        retarget_bounds(callback, delay_ms);
    });

    on_cleanup(teardown_map);

    // Clear-and-rebuild whenever the venue set, selection or zoom changes.
    Effect::new(move || {
        let current = selected.0.get();
        let Some(zoom) = zoom.get() else {
            return;
        };
        let groups = venues.with(|venues| {
            plan_markers(venues, current.as_deref(), Some(zoom), cluster_cell)
        });
        render_markers(groups, current, selected);
    });

    view! { <div class="venue-map" node_ref=container></div> }
}

fn mount_map(
    element: &web_sys::HtmlElement,
    config: &ClientConfig,
    on_bounds: Callback<BoundingBox>,
    zoom: RwSignal<Option<f64>>,
    selected: Selected,
) -> Result<(), JsValue> {
    let map = leaflet::create_map(
        element,
        &leaflet::options(&MapOptions {
            zoom_control: true,
            scroll_wheel_zoom: true,
        }),
    )?;
    map.set_view(&leaflet::lat_lng(DEFAULT_MAP_CENTER), DEFAULT_MAP_ZOOM);
    leaflet::tile_layer(
        TILE_URL,
        &leaflet::options(&TileLayerOptions {
            attribution: TILE_ATTRIBUTION,
            max_zoom: 19,
        }),
    )
    .add_to(&map);
    let markers = leaflet::layer_group();
    markers.add_to(&map);

    let controller = Rc::new(RefCell::new(BoundsController::new(
        config.bounds_debounce_ms,
        move |bounds| on_bounds.run(bounds),
    )));
    let timer = DeadlineTimer::new();

    let on_settled = {
        let map = map.clone();
        let controller = Rc::clone(&controller);
        let timer = timer.clone();
        Closure::<dyn Fn(JsValue)>::new(move |_event: JsValue| {
            settle(&map, &controller, &timer, zoom);
        })
    };
    map.on("moveend", on_settled.as_ref().unchecked_ref());
    map.on("zoomend", on_settled.as_ref().unchecked_ref());

    let on_map_click = Closure::<dyn Fn(JsValue)>::new(move |_event: JsValue| {
        selected.deselect();
    });
    map.on("click", on_map_click.as_ref().unchecked_ref());

    // First emission waits one tick so the container has its final size.
    let initial_emit = {
        let map = map.clone();
        let controller = Rc::clone(&controller);
        let timer = timer.clone();
        Timeout::new(0, move || {
            map.invalidate_size();
            settle(&map, &controller, &timer, zoom);
        })
    };

    MAP_BINDING.with(|slot| {
        *slot.borrow_mut() = Some(MapBinding {
            map,
            markers,
            controller,
            timer,
            initial_emit: Some(initial_emit),
            on_settled,
            on_map_click,
            marker_handlers: Vec::new(),
            last_selected: None,
        });
    });
    Ok(())
}

fn retarget_bounds(on_bounds: Callback<BoundingBox>, delay_ms: u32) {
    MAP_BINDING.with(|slot| {
        let slot = slot.borrow();
        let Some(binding) = slot.as_ref() else {
            return;
        };
        let mut controller = binding.controller.borrow_mut();
        controller.set_on_bounds(move |bounds| on_bounds.run(bounds));
        controller.set_delay(delay_ms);
    });
}

fn settle(
    map: &leaflet::Map,
    controller: &Rc<RefCell<BoundsController>>,
    timer: &DeadlineTimer,
    zoom: RwSignal<Option<f64>>,
) {
    let current_zoom = map.get_zoom();
    if current_zoom.is_finite() && zoom.get_untracked() != Some(current_zoom) {
        zoom.set(Some(current_zoom));
    }
    let scheduled = controller
        .borrow_mut()
        .viewport_settled(map, js_sys::Date::now());
    if scheduled.is_some() {
        timer.rearm(controller);
    }
}

fn teardown_map() {
    let Some(binding) = MAP_BINDING.with(|slot| slot.borrow_mut().take()) else {
        return;
    };
    binding
        .map
        .off("moveend", binding.on_settled.as_ref().unchecked_ref());
    binding
        .map
        .off("zoomend", binding.on_settled.as_ref().unchecked_ref());
    binding
        .map
        .off("click", binding.on_map_click.as_ref().unchecked_ref());
    if let Some(initial) = binding.initial_emit {
        initial.cancel();
    }
    binding.timer.cancel();
    binding.controller.borrow_mut().teardown();
    binding.markers.clear_layers();
    binding.map.remove();
}

fn render_markers(groups: Vec<MarkerGroup>, current: Option<String>, selected: Selected) {
    MAP_BINDING.with(|slot| {
        let mut slot = slot.borrow_mut();
        let Some(binding) = slot.as_mut() else {
            return;
        };
        binding.markers.clear_layers();
        binding.marker_handlers.clear();

        let selection_changed = binding.last_selected != current;
        binding.last_selected = current;

        for group in groups {
            match group {
                MarkerGroup::Single(spec) => {
                    let open_popup = selection_changed && spec.selected;
                    add_venue_marker(binding, spec, selected, open_popup);
                }
                MarkerGroup::Cluster(cluster) => add_cluster_marker(binding, cluster),
            }
        }
    });
}

fn add_venue_marker(binding: &mut MapBinding, spec: MarkerSpec, selected: Selected, open_popup: bool) {
    let size = if spec.selected {
        SELECTED_PIN_SIZE
    } else {
        PIN_SIZE
    };
    let icon = leaflet::div_icon(&leaflet::options(&DivIconOptions {
        html: r#"<span class="venue-pin-dot"></span>"#,
        class_name: pin_class(spec.selected),
        icon_size: [size, size],
        icon_anchor: [size / 2.0, size / 2.0],
    }));
    let z_offset = if spec.selected { 1000 } else { 0 };
    let marker = leaflet::marker(
        &leaflet::lat_lng(spec.position),
        &leaflet::marker_options(&icon, z_offset),
    );
    marker.bind_popup(&spec.popup_html);

    let id = spec.id;
    let on_click = Closure::<dyn Fn(JsValue)>::new(move |event: JsValue| {
        leaflet::stop_propagation(&event);
        selected.select(&id);
    });
    marker.on("click", on_click.as_ref().unchecked_ref());
    binding.markers.add_layer(&marker);
    if open_popup {
        marker.open_popup();
    }
    binding.marker_handlers.push(on_click);
}

fn add_cluster_marker(binding: &mut MapBinding, cluster: Cluster) {
    let (html, size) = cluster_icon_html(&cluster);
    let icon = leaflet::div_icon(&leaflet::options(&DivIconOptions {
        html: &html,
        class_name: "venue-cluster-icon",
        icon_size: [size, size],
        icon_anchor: [size / 2.0, size / 2.0],
    }));
    let marker = leaflet::marker(
        &leaflet::lat_lng(cluster.center),
        &leaflet::marker_options(&icon, 500),
    );

    let map = binding.map.clone();
    let bounds = cluster.bounds;
    let on_click = Closure::<dyn Fn(JsValue)>::new(move |event: JsValue| {
        leaflet::stop_propagation(&event);
        map.fit_bounds(
            &leaflet::lat_lng_bounds(
                LatLng::new(bounds.south, bounds.west),
                LatLng::new(bounds.north, bounds.east),
            ),
            &leaflet::options(&FitBoundsOptions {
                padding: CLUSTER_FIT_PADDING,
                max_zoom: CLUSTER_FIT_MAX_ZOOM,
            }),
        );
    });
    marker.on("click", on_click.as_ref().unchecked_ref());
    binding.markers.add_layer(&marker);
    binding.marker_handlers.push(on_click);
}
