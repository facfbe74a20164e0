use leptos::prelude::*;
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use venuemap_shared::auth::is_admin_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Venues,
    Login,
    AdminDashboard,
    NotFound,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Home,
            "/venues" => Route::Venues,
            "/login" => Route::Login,
            path if is_admin_path(path) => Route::AdminDashboard,
            _ => Route::NotFound,
        }
    }
}

/// Browser location split into path and query string (without `?`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub query: String,
}

impl Location {
    pub fn parse(href: &str) -> Self {
        let href = href.split('#').next().unwrap_or_default();
        let (path, query) = href.split_once('?').unwrap_or((href, ""));
        Self {
            path: if path.is_empty() { "/".into() } else { path.into() },
            query: query.into(),
        }
    }

    pub fn route(&self) -> Route {
        Route::parse(&self.path)
    }

    /// First value of `name` in the query string, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(key, _)| percent_decode(key) == name)
            .map(|(_, value)| percent_decode(value))
    }
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

struct PopStateBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn(web_sys::Event)>,
}

thread_local! {
    static POPSTATE_BINDING: RefCell<Option<PopStateBinding>> = const { RefCell::new(None) };
}

fn current_location() -> Location {
    let Some(window) = web_sys::window() else {
        return Location::parse("/");
    };
    let location = window.location();
    let path = location.pathname().unwrap_or_else(|_| "/".into());
    let search = location.search().unwrap_or_default();
    Location::parse(&format!("{path}{search}"))
}

/// History-API router handle, provided via context.
#[derive(Clone, Copy)]
pub struct Router {
    location: RwSignal<Location>,
}

impl Router {
    pub fn new() -> Self {
        let location = RwSignal::new(current_location());
        let router = Self { location };
        router.listen();
        router
    }

    pub fn location(&self) -> ReadSignal<Location> {
        self.location.read_only()
    }

    pub fn route(&self) -> Memo<Route> {
        let location = self.location;
        Memo::new(move |_| location.with(Location::route))
    }

    pub fn navigate(&self, href: &str) {
        self.go(href, false);
    }

    /// Navigate without adding a history entry.
    pub fn replace(&self, href: &str) {
        self.go(href, true);
    }

    fn go(&self, href: &str, replace: bool) {
        if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
            let pushed = if replace {
                history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(href))
            } else {
                history.push_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(href))
            };
            if pushed.is_err() {
                return;
            }
        }
        self.location.set(Location::parse(href));
    }

    fn listen(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        POPSTATE_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old
                    .window
                    .remove_event_listener_with_callback("popstate", old.handler.as_ref().unchecked_ref());
            }
        });
        let location = self.location;
        let handler = Closure::<dyn Fn(web_sys::Event)>::new(move |_event: web_sys::Event| {
            location.set(current_location());
        });
        if window
            .add_event_listener_with_callback("popstate", handler.as_ref().unchecked_ref())
            .is_err()
        {
            return;
        }
        POPSTATE_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(PopStateBinding { window, handler });
        });
    }
}

/// In-app link. Plain clicks navigate through the router; modified clicks
/// fall through to the browser.
#[component]
pub fn Link(
    href: &'static str,
    #[prop(optional)] class: &'static str,
    children: Children,
) -> impl IntoView {
    let router: Router = expect_context();
    let on_click = move |ev: web_sys::MouseEvent| {
        if ev.button() != 0 || ev.ctrl_key() || ev.meta_key() || ev.shift_key() || ev.alt_key() {
            return;
        }
        ev.prevent_default();
        router.navigate(href);
    };
    view! {
        <a href=href class=class on:click=on_click>
            {children()}
        </a>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse("/venues"), Route::Venues);
        assert_eq!(Route::parse("/venues/"), Route::Venues);
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/admin"), Route::AdminDashboard);
        assert_eq!(Route::parse("/admin/dashboard"), Route::AdminDashboard);
        assert_eq!(Route::parse("/admin/settings"), Route::AdminDashboard);
        assert_eq!(Route::parse("/administrator"), Route::NotFound);
        assert_eq!(Route::parse("/nope"), Route::NotFound);
    }

    #[test]
    fn location_splits_query_and_fragment() {
        let location = Location::parse("/login?redirect=/admin/dashboard#top");
        assert_eq!(location.path, "/login");
        assert_eq!(location.query, "redirect=/admin/dashboard");
        assert_eq!(location.route(), Route::Login);
    }

    #[test]
    fn query_param_is_decoded() {
        let location = Location::parse("/login?x=1&redirect=%2Fadmin%2Fdashboard&q=a+b");
        assert_eq!(
            location.query_param("redirect").as_deref(),
            Some("/admin/dashboard")
        );
        assert_eq!(location.query_param("q").as_deref(), Some("a b"));
        assert_eq!(location.query_param("missing"), None);
    }

    #[test]
    fn malformed_escape_is_kept() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }
}
