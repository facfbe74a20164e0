use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use venuemap_shared::auth::login_redirect_url;
use venuemap_shared::display::{format_coordinates, format_short_date};
use venuemap_shared::form::VenueForm;
use venuemap_shared::{QueryTarget, Venue, VenueId, VenueInput};

use crate::api::{HttpTransport, VenueSource};
use crate::auth::{AuthSession, SessionState};
use crate::config::ClientConfig;
use crate::log;
use crate::query::VenueQuery;
use crate::router::{Link, Router};

pub const DELETE_CONFIRM: &str = "Delete this venue?";
pub const EMPTY_TABLE_MESSAGE: &str = "No venues yet. Add your first venue.";

#[derive(Debug, Clone, PartialEq)]
enum FormMode {
    Create,
    Edit(VenueId),
}

impl FormMode {
    fn title(&self) -> &'static str {
        match self {
            FormMode::Create => "Add Venue",
            FormMode::Edit(_) => "Edit Venue",
        }
    }
}

/// Session gate for the dashboard. Shows a spinner until the stored session
/// has been read, then either the dashboard or a redirect to login.
#[component]
pub fn AdminDashboard() -> impl IntoView {
    let auth: AuthSession = expect_context();
    let router: Router = expect_context();
    let session = auth.state();

    Effect::new(move || {
        let state = session.get();
        if state.hydrated && !state.is_authenticated() {
            let path = router.location().with_untracked(|l| l.path.clone());
            router.replace(&login_redirect_url(&path));
        }
    });

    view! {
        <Show
            when=move || session.with(SessionState::is_authenticated)
            fallback=|| view! { <div class="page-spinner"><div class="spinner"></div></div> }
        >
            <Dashboard />
        </Show>
    }
}

#[component]
fn Dashboard() -> impl IntoView {
    let config: ClientConfig = expect_context();
    let auth: AuthSession = expect_context();
    let router: Router = expect_context();
    let token = auth.token();
    let session = auth.state();

    let query = VenueQuery::new(config.clone(), token);
    query.set_target(QueryTarget::All);
    let state = query.state();

    let config = StoredValue::new(config);
    let source = move || -> Option<VenueSource<HttpTransport>> {
        let config = config.try_get_value()?;
        Some(VenueSource::from_config(&config).with_token(token.get_untracked()))
    };

    let mode: RwSignal<Option<FormMode>> = RwSignal::new(None);
    let form = RwSignal::new(VenueForm::default());
    let form_error: RwSignal<Option<String>> = RwSignal::new(None);
    let saving = RwSignal::new(false);
    let notice: RwSignal<Option<String>> = RwSignal::new(None);

    let open_create = move |_| {
        form.set(VenueForm::default());
        form_error.set(None);
        mode.set(Some(FormMode::Create));
    };
    let open_edit = move |venue: &Venue| {
        form.set(VenueForm::from_venue(venue));
        form_error.set(None);
        mode.set(Some(FormMode::Edit(venue.id.clone())));
    };
    let close = Callback::new(move |()| {
        if !saving.get_untracked() {
            mode.set(None);
        }
    });

    let save = Callback::new(move |input: VenueInput| {
        let Some(current) = mode.get_untracked() else {
            return;
        };
        let Some(source) = source() else {
            return;
        };
        saving.set(true);
        form_error.set(None);
        spawn_local(async move {
            let result = match current {
                FormMode::Create => source.create(input).await,
                FormMode::Edit(id) => source.update(input.into_update(id)).await,
            };
            saving.set(false);
            match result {
                Ok(venue) => {
                    log::info(&format!("saved venue {}", venue.id));
                    mode.set(None);
                    query.invalidate_all();
                }
                Err(err) => {
                    log::warn(&format!("save failed: {err}"));
                    form_error.set(Some(err.user_message()));
                }
            }
        });
    });

    let delete = move |id: VenueId| {
        let confirmed = web_sys::window()
            .and_then(|w| w.confirm_with_message(DELETE_CONFIRM).ok())
            .unwrap_or(false);
        if !confirmed {
            return;
        }
        let Some(source) = source() else {
            return;
        };
        notice.set(None);
        spawn_local(async move {
            match source.delete(&id).await {
                Ok(()) => query.invalidate_all(),
                Err(err) => {
                    log::warn(&format!("delete {id} failed: {err}"));
                    notice.set(Some(err.user_message()));
                }
            }
        });
    };

    let logout = move |_| {
        auth.clear();
        router.navigate("/login");
    };

    let venues = Memo::new(move |_| state.with(|s| s.venues.clone()));
    let is_loading = move || state.with(|s| s.is_loading);
    let load_error = move || state.with(|s| s.error.as_ref().map(|e| e.user_message()));

    view! {
        <div class="page page--admin">
            <nav class="site-nav">
                <Link href="/" class="site-nav-brand">"Venue Finder"</Link>
                <div class="site-nav-links">
                    <span class="site-nav-user">
                        {move || session.with(|s| s.user.as_ref().map(|u| u.email.clone()))}
                    </span>
                    <Link href="/venues">"View Venues"</Link>
                    <button class="btn btn-small" on:click=logout>"Logout"</button>
                </div>
            </nav>
            <main class="admin-main">
                <header class="admin-header">
                    <h1>"Admin Dashboard"</h1>
                    <button class="btn btn-primary" on:click=open_create>"Add Venue"</button>
                </header>
                {move || notice.get().map(|message| view! {
                    <div class="form-error" role="alert">{message}</div>
                })}
                {move || load_error().map(|message| view! {
                    <div class="form-error" role="alert">
                        {message}
                        <button class="btn btn-small" on:click=move |_| query.refetch()>"Retry"</button>
                    </div>
                })}
                <Show
                    when=move || !is_loading()
                    fallback=|| view! { <div class="page-spinner"><div class="spinner"></div></div> }
                >
                    <Show
                        when=move || venues.with(|v| !v.is_empty())
                        fallback=|| view! { <p class="admin-empty">{EMPTY_TABLE_MESSAGE}</p> }
                    >
                        <table class="admin-table">
                            <thead>
                                <tr>
                                    <th>"Name"</th>
                                    <th>"Address"</th>
                                    <th>"Location"</th>
                                    <th>"Updated"</th>
                                    <th>"Actions"</th>
                                </tr>
                            </thead>
                            <tbody>
                                <For
                                    each=move || venues.get()
                                    key=|venue| venue.id.clone()
                                    children=move |venue| {
                                        let id = venue.id.clone();
                                        let location = format_coordinates(venue.latitude, venue.longitude);
                                        let address = venue.address.clone().unwrap_or_else(|| "—".to_string());
                                        let name = venue.name.clone();
                                        let updated = venue
                                            .updated_at
                                            .as_deref()
                                            .or(venue.created_at.as_deref())
                                            .map(format_short_date)
                                            .unwrap_or_else(|| "—".to_string());
                                        view! {
                                            <tr>
                                                <td>{name}</td>
                                                <td>{address}</td>
                                                <td class="admin-table-location">{location}</td>
                                                <td>{updated}</td>
                                                <td class="admin-table-actions">
                                                    <button class="btn btn-small" on:click=move |_| open_edit(&venue)>
                                                        "Edit"
                                                    </button>
                                                    <button
                                                        class="btn btn-small btn-danger"
                                                        on:click=move |_| delete(id.clone())
                                                    >
                                                        "Delete"
                                                    </button>
                                                </td>
                                            </tr>
                                        }
                                    }
                                />
                            </tbody>
                        </table>
                    </Show>
                </Show>
            </main>
            {move || mode.get().map(|mode| view! {
                <VenueFormModal
                    title=mode.title()
                    form=form
                    error=form_error
                    saving=saving.read_only()
                    on_save=save
                    on_cancel=close
                />
            })}
        </div>
    }
}

/// Create/edit dialog. Validates locally before handing a [`VenueInput`] to
/// `on_save`; server failures come back through `error`.
#[component]
fn VenueFormModal(
    title: &'static str,
    form: RwSignal<VenueForm>,
    error: RwSignal<Option<String>>,
    saving: ReadSignal<bool>,
    on_save: Callback<VenueInput>,
    on_cancel: Callback<()>,
) -> impl IntoView {
    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }
        match form.with_untracked(VenueForm::validate) {
            Ok(input) => on_save.run(input),
            Err(err) => error.set(Some(err.to_string())),
        }
    };

    view! {
        <div class="modal-backdrop" on:click=move |_| on_cancel.run(())>
            <form
                class="modal"
                on:click=|ev| ev.stop_propagation()
                on:submit=on_submit
            >
                <h2>{title}</h2>
                {move || error.get().map(|message| view! {
                    <div class="form-error" role="alert">{message}</div>
                })}
                <label class="form-field">
                    <span>"Name *"</span>
                    <input
                        type="text"
                        required
                        prop:value=move || form.with(|f| f.name.clone())
                        on:input=move |ev| form.update(|f| f.name = event_target_value(&ev))
                    />
                </label>
                <label class="form-field">
                    <span>"Description"</span>
                    <textarea
                        rows="2"
                        prop:value=move || form.with(|f| f.description.clone())
                        on:input=move |ev| form.update(|f| f.description = event_target_value(&ev))
                    ></textarea>
                </label>
                <label class="form-field">
                    <span>"Address"</span>
                    <input
                        type="text"
                        prop:value=move || form.with(|f| f.address.clone())
                        on:input=move |ev| form.update(|f| f.address = event_target_value(&ev))
                    />
                </label>
                <div class="form-row">
                    <label class="form-field">
                        <span>"Latitude *"</span>
                        <input
                            type="number"
                            step="any"
                            required
                            prop:value=move || form.with(|f| f.latitude.clone())
                            on:input=move |ev| form.update(|f| f.latitude = event_target_value(&ev))
                        />
                    </label>
                    <label class="form-field">
                        <span>"Longitude *"</span>
                        <input
                            type="number"
                            step="any"
                            required
                            prop:value=move || form.with(|f| f.longitude.clone())
                            on:input=move |ev| form.update(|f| f.longitude = event_target_value(&ev))
                        />
                    </label>
                </div>
                <label class="form-field">
                    <span>"Capacity"</span>
                    <input
                        type="number"
                        min="1"
                        prop:value=move || form.with(|f| f.capacity.clone())
                        on:input=move |ev| form.update(|f| f.capacity = event_target_value(&ev))
                    />
                </label>
                <label class="form-field">
                    <span>"Image URL"</span>
                    <input
                        type="url"
                        prop:value=move || form.with(|f| f.image_url.clone())
                        on:input=move |ev| form.update(|f| f.image_url = event_target_value(&ev))
                    />
                </label>
                <div class="modal-actions">
                    <button class="btn" type="button" on:click=move |_| on_cancel.run(())>"Cancel"</button>
                    <button class="btn btn-primary" type="submit" disabled=move || saving.get()>
                        {move || if saving.get() { "Saving…" } else { title }}
                    </button>
                </div>
            </form>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modal_title_follows_mode() {
        assert_eq!(FormMode::Create.title(), "Add Venue");
        assert_eq!(FormMode::Edit("v1".into()).title(), "Edit Venue");
    }
}
