use leptos::prelude::*;

use venuemap_shared::display::{format_price_range, format_rating};
use venuemap_shared::colors::rgba_css;
use venuemap_shared::{Venue, category_color};

use crate::query::QueryState;
use crate::selection::Selected;

const SKELETON_ROWS: usize = 4;

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load venues. Ensure the API is running.";
pub const EMPTY_MESSAGE: &str = "No venues in this area. Try moving the map.";

/// Scrollable list of venue cards for the current query state.
#[component]
pub fn VenueList(#[prop(into)] state: Signal<QueryState>, on_retry: Callback<()>) -> impl IntoView {
    let venues = Memo::new(move |_| state.with(|s| s.venues.clone()));
    let is_loading = move || state.with(|s| s.is_loading);
    let error = move || state.with(|s| s.error.clone());
    let updating = move || state.with(|s| s.is_fetching && !s.is_loading);
    let is_empty = move || state.with(|s| !s.is_loading && s.error.is_none() && s.venues.is_empty());

    view! {
        <section class="venue-list">
            <header class="venue-list-header">
                <span class="venue-list-count">
                    {move || {
                        let n = venues.with(Vec::len);
                        if n == 1 { "1 venue".to_string() } else { format!("{n} venues") }
                    }}
                </span>
                <Show when=updating>
                    <span class="venue-list-updating">"Updating…"</span>
                </Show>
            </header>
            {move || error().map(|err| view! {
                <div class="venue-list-error" role="alert" title=err.to_string()>
                    <p>{LOAD_ERROR_MESSAGE}</p>
                    <button class="btn btn-small" on:click=move |_| on_retry.run(())>"Retry"</button>
                </div>
            })}
            <Show when=is_loading>
                <div class="venue-list-skeleton">
                    {(0..SKELETON_ROWS)
                        .map(|_| view! { <div class="venue-card venue-card--skeleton"></div> })
                        .collect_view()}
                </div>
            </Show>
            <Show when=is_empty>
                <p class="venue-list-empty">{EMPTY_MESSAGE}</p>
            </Show>
            <div class="venue-list-items">
                <For
                    each=move || venues.get()
                    key=|venue| venue.id.clone()
                    children=move |venue| view! { <VenueCard venue=venue /> }
                />
            </div>
        </section>
    }
}

/// Card for one venue. Registers its element with the selection coordinator
/// while mounted so selecting the venue elsewhere can scroll it into view.
#[component]
pub fn VenueCard(venue: Venue) -> impl IntoView {
    let selected: Selected = expect_context();
    let node = NodeRef::<leptos::html::Article>::new();
    let id = venue.id.clone();

    Effect::new({
        let id = id.clone();
        move || {
            if let Some(element) = node.get() {
                selected.register(&id, element.into());
            }
        }
    });
    on_cleanup({
        let id = id.clone();
        move || selected.unregister(&id)
    });

    let is_selected = Memo::new({
        let id = id.clone();
        move |_| selected.0.with(|current| current.as_deref() == Some(id.as_str()))
    });
    let class = move || {
        if is_selected.get() {
            "venue-card venue-card--selected"
        } else {
            "venue-card"
        }
    };

    let badge = venue.category.clone().map(|category| {
        let (r, g, b) = category_color(&category);
        let style = format!(
            "background:{};color:{};",
            rgba_css(r, g, b, 0.12),
            rgba_css(r, g, b, 1.0)
        );
        view! { <span class="venue-card-category" style=style>{category}</span> }
    });
    let rating = venue
        .rating
        .map(|rating| format_rating(rating, venue.review_count));
    let price = venue.price_range.map(format_price_range);
    let capacity = venue.capacity.map(|c| format!("Capacity: {c}"));

    view! {
        <article
            class=class
            node_ref=node
            aria-selected=move || is_selected.get().to_string()
            on:click=move |_| selected.select(&id)
        >
            {venue.image_url.clone().map(|src| view! {
                <img class="venue-card-image" src=src alt=venue.name.clone() loading="lazy" />
            })}
            <div class="venue-card-body">
                <div class="venue-card-title">
                    <h3 class="venue-card-name">{venue.name.clone()}</h3>
                    {badge}
                </div>
                {venue.address.clone().map(|a| view! { <p class="venue-card-address">{a}</p> })}
                {venue.description.clone().map(|d| view! { <p class="venue-card-description">{d}</p> })}
                <div class="venue-card-meta">
                    {capacity.map(|c| view! { <span>{c}</span> })}
                    {rating.map(|r| view! { <span class="venue-card-rating">{r}</span> })}
                    {price.map(|p| view! { <span class="venue-card-price">{p}</span> })}
                </div>
            </div>
        </article>
    }
}
