use leptos::prelude::*;
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use venuemap_shared::{BoundingBox, QueryTarget};

use crate::auth::AuthSession;
use crate::config::{ClientConfig, DEFAULT_BOUNDS};
use crate::map_view::VenueMap;
use crate::query::VenueQuery;
use crate::router::Link;
use crate::selection::Selected;
use crate::venue_list::VenueList;

struct KeydownBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
}

#[component]
pub fn SiteNav() -> impl IntoView {
    view! {
        <nav class="site-nav">
            <Link href="/" class="site-nav-brand">"Venue Finder"</Link>
            <div class="site-nav-links">
                <Link href="/venues">"Browse Venues"</Link>
                <Link href="/login">"Login"</Link>
                <Link href="/admin/dashboard">"Admin"</Link>
            </div>
        </nav>
    }
}

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <div class="page">
            <SiteNav />
            <main class="hero">
                <h1>"Discover amazing venues"</h1>
                <p>
                    "Browse event spaces, restaurants and meeting rooms on an interactive map. "
                    "Pan around to see what is nearby and pick a venue to learn more."
                </p>
                <Link href="/venues" class="btn btn-primary">"View Venues"</Link>
            </main>
        </div>
    }
}

/// List and map side by side, both driven by one bounds-keyed query.
#[component]
pub fn VenuesPage() -> impl IntoView {
    let config: ClientConfig = expect_context();
    let auth: AuthSession = expect_context();
    let selected = Selected::new();
    provide_context(selected);

    let query = VenueQuery::new(config, auth.token());
    query.set_target(QueryTarget::Within(DEFAULT_BOUNDS));
    let state = query.state();
    let venues = Signal::derive(move || state.with(|s| s.venues.clone()));

    let on_bounds = Callback::new(move |bounds: BoundingBox| {
        query.set_target(QueryTarget::Within(bounds));
    });
    let on_retry = Callback::new(move |()| query.refetch());

    Effect::new(move || install_escape_binding(selected));
    on_cleanup(remove_escape_binding);

    view! {
        <div class="page page--venues">
            <SiteNav />
            <h1 class="page-title">"Venues"</h1>
            <div class="venues-layout">
                <aside class="venues-sidebar">
                    <VenueList state=state on_retry=on_retry />
                </aside>
                <div class="venues-map">
                    <VenueMap venues=venues on_bounds=on_bounds />
                </div>
            </div>
        </div>
    }
}

#[component]
pub fn NotFound() -> impl IntoView {
    view! {
        <div class="page">
            <SiteNav />
            <main class="hero">
                <h1>"Page not found"</h1>
                <Link href="/" class="btn">"Back home"</Link>
            </main>
        </div>
    }
}

/// Escape clears the selection unless focus is in a text field.
fn install_escape_binding(selected: Selected) {
    let Some(window) = web_sys::window() else {
        return;
    };
    remove_escape_binding();

    let handler = Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
        if e.key() != "Escape" {
            return;
        }
        let target = e
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok());
        let tag = target.as_ref().map(|el| el.tag_name()).unwrap_or_default();
        if tag == "INPUT" || tag == "TEXTAREA" {
            if let Some(el) = target {
                el.blur().ok();
            }
            return;
        }
        selected.deselect();
    });

    if window
        .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
        .is_ok()
    {
        KEYDOWN_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(KeydownBinding { window, handler });
        });
    }
}

fn remove_escape_binding() {
    KEYDOWN_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            let _ = old
                .window
                .remove_event_listener_with_callback("keydown", old.handler.as_ref().unchecked_ref());
        }
    });
}
