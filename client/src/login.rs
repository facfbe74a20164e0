use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use venuemap_shared::auth::{LoginCredentials, safe_redirect};

use crate::api::{ApiError, VenueSource};
use crate::auth::AuthSession;
use crate::config::ClientConfig;
use crate::log;
use crate::router::{Link, Router};

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Check credentials or API connection.";

/// Server-provided reason when there is one, otherwise the generic message.
pub fn login_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
        _ => LOGIN_FAILED_MESSAGE.to_string(),
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let config: ClientConfig = expect_context();
    let auth: AuthSession = expect_context();
    let router: Router = expect_context();
    let config = StoredValue::new(config);

    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let submitting = RwSignal::new(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if submitting.get_untracked() {
            return;
        }
        let Some(config) = config.try_get_value() else {
            return;
        };
        submitting.set(true);
        error.set(None);

        let credentials = LoginCredentials {
            email: email.get_untracked().trim().to_string(),
            password: password.get_untracked(),
        };
        let redirect = router
            .location()
            .with_untracked(|l| safe_redirect(l.query_param("redirect").as_deref()));

        spawn_local(async move {
            match VenueSource::from_config(&config).login(&credentials).await {
                Ok(response) => {
                    log::info(&format!("signed in as {}", response.user.email));
                    auth.set(response.token, response.user);
                    router.navigate(&redirect);
                }
                Err(err) => {
                    log::warn(&format!("login failed: {err}"));
                    error.set(Some(login_error_message(&err)));
                    submitting.set(false);
                }
            }
        });
    };

    view! {
        <div class="page page--login">
            <form class="login-card" on:submit=on_submit>
                <h1>"Admin Login"</h1>
                <p class="login-subtitle">"Sign in to manage venues"</p>
                {move || error.get().map(|message| view! {
                    <div class="form-error" role="alert">{message}</div>
                })}
                <label class="form-field">
                    <span>"Email"</span>
                    <input
                        type="email"
                        required
                        autocomplete="username"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                    />
                </label>
                <label class="form-field">
                    <span>"Password"</span>
                    <input
                        type="password"
                        required
                        autocomplete="current-password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                </label>
                <button class="btn btn-primary" type="submit" disabled=move || submitting.get()>
                    {move || if submitting.get() { "Signing in…" } else { "Sign in" }}
                </button>
                <Link href="/" class="login-back">"Back to home"</Link>
            </form>
        </div>
    }
}
