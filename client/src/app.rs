use leptos::prelude::*;

use crate::admin::AdminDashboard;
use crate::auth::AuthSession;
use crate::config::ClientConfig;
use crate::log;
use crate::login::LoginPage;
use crate::pages::{HomePage, NotFound, VenuesPage};
use crate::router::{Route, Router};

fn remove_loading_shell() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    if let Some(shell) = document.get_element_by_id("app-loading-shell") {
        shell.remove();
    }
}

#[component]
pub fn App() -> impl IntoView {
    let config = ClientConfig::from_build_env();
    log::info(&format!(
        "api={} mock={} debounce={}ms",
        config.api_url, config.use_mock, config.bounds_debounce_ms
    ));
    provide_context(config);

    let auth = AuthSession::new();
    provide_context(auth);
    let router = Router::new();
    provide_context(router);

    // Session is read after the first render so guarded pages show their spinner.
    Effect::new(move || {
        auth.hydrate();
        remove_loading_shell();
    });

    let route = router.route();
    move || match route.get() {
        Route::Home => view! { <HomePage /> }.into_any(),
        Route::Venues => view! { <VenuesPage /> }.into_any(),
        Route::Login => view! { <LoginPage /> }.into_any(),
        Route::AdminDashboard => view! { <AdminDashboard /> }.into_any(),
        Route::NotFound => view! { <NotFound /> }.into_any(),
    }
}
