use std::collections::HashMap;

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use venuemap_shared::{BoundingBox, QueryKey, QueryTarget, Venue};

use crate::api::{ApiError, VenueSource};
use crate::config::ClientConfig;
use crate::log;

/// A fetch the cache wants issued. Hand the result back through
/// [`VenueQueryCache::resolve`] with the same `id` and `key`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchRequest {
    pub id: u64,
    pub key: QueryKey,
    pub bounds: Option<BoundingBox>,
}

#[derive(Debug, Default)]
struct Entry {
    data: Option<Vec<Venue>>,
    error: Option<ApiError>,
    in_flight: Option<u64>,
}

/// What the list and map layers render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryState {
    pub venues: Vec<Venue>,
    /// `venues` belongs to an earlier key and is shown while the current key loads.
    pub is_placeholder: bool,
    /// Nothing to show yet for any key.
    pub is_loading: bool,
    /// A fetch for the current key is outstanding.
    pub is_fetching: bool,
    pub error: Option<ApiError>,
}

/// Venue results keyed by canonical bounds.
///
/// Entries are never evicted. A result is only ever displayed for the key the
/// target points at when the view is read, so a late response for an old
/// viewport lands in its own slot and cannot overwrite what is on screen.
#[derive(Debug, Default)]
pub struct VenueQueryCache {
    entries: HashMap<QueryKey, Entry>,
    target: Option<QueryTarget>,
    /// Last key whose data was on screen; source of placeholder data.
    displayed: Option<QueryKey>,
    next_id: u64,
}

impl VenueQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the cache at a new target. Returns the fetch to issue, if any:
    /// none when disabled, when unchanged, or when a fetch for the key is
    /// already in flight.
    pub fn set_target(&mut self, target: QueryTarget) -> Option<FetchRequest> {
        if self.target == Some(target) {
            return None;
        }
        self.target = Some(target);
        let key = target.key()?;
        if self.entries.get(&key).is_some_and(|e| e.data.is_some()) {
            self.displayed = Some(key);
        }
        self.issue(key, target.bounds(), false)
    }

    /// Retry the current key unless a fetch is already running.
    pub fn refetch(&mut self) -> Option<FetchRequest> {
        let target = self.target?;
        self.issue(target.key()?, target.bounds(), false)
    }

    /// Mark every cached result as outdated and refetch the current key.
    /// A fetch already in flight for it is superseded.
    pub fn invalidate_all(&mut self) -> Option<FetchRequest> {
        let target = self.target?;
        self.issue(target.key()?, target.bounds(), true)
    }

    fn issue(
        &mut self,
        key: QueryKey,
        bounds: Option<BoundingBox>,
        supersede: bool,
    ) -> Option<FetchRequest> {
        let entry = self.entries.entry(key).or_default();
        if entry.in_flight.is_some() && !supersede {
            return None;
        }
        self.next_id += 1;
        entry.in_flight = Some(self.next_id);
        entry.error = None;
        Some(FetchRequest {
            id: self.next_id,
            key,
            bounds,
        })
    }

    /// Store a fetch result. Results for superseded requests are dropped.
    /// Returns whether the request was still current for its key.
    pub fn resolve(&mut self, request: &FetchRequest, result: Result<Vec<Venue>, ApiError>) -> bool {
        let Some(entry) = self.entries.get_mut(&request.key) else {
            return false;
        };
        if entry.in_flight != Some(request.id) {
            return false;
        }
        entry.in_flight = None;
        match result {
            Ok(venues) => {
                entry.data = Some(venues);
                entry.error = None;
            }
            Err(err) => entry.error = Some(err),
        }

        let is_current = self.target.and_then(|t| t.key()) == Some(request.key);
        if is_current && entry.data.is_some() {
            self.displayed = Some(request.key);
        }
        true
    }

    fn has_any_data(&self) -> bool {
        self.entries.values().any(|e| e.data.is_some())
    }

    pub fn view(&self) -> QueryState {
        let Some(key) = self.target.and_then(|t| t.key()) else {
            return QueryState::default();
        };
        let entry = self.entries.get(&key);
        let is_fetching = entry.is_some_and(|e| e.in_flight.is_some());
        let error = entry.and_then(|e| e.error.clone());

        if let Some(data) = entry.and_then(|e| e.data.as_ref()) {
            return QueryState {
                venues: data.clone(),
                is_placeholder: false,
                is_loading: false,
                is_fetching,
                error,
            };
        }

        let placeholder = self
            .displayed
            .filter(|_| error.is_none())
            .and_then(|k| self.entries.get(&k))
            .and_then(|e| e.data.as_ref());
        match placeholder {
            Some(data) => QueryState {
                venues: data.clone(),
                is_placeholder: true,
                is_loading: false,
                is_fetching,
                error: None,
            },
            None => QueryState {
                venues: Vec::new(),
                is_placeholder: false,
                is_loading: is_fetching && !self.has_any_data(),
                is_fetching,
                error,
            },
        }
    }
}

/// Reactive handle over a [`VenueQueryCache`] that runs its fetches.
#[derive(Clone, Copy)]
pub struct VenueQuery {
    cache: StoredValue<VenueQueryCache>,
    state: RwSignal<QueryState>,
    config: StoredValue<ClientConfig>,
    token: Signal<Option<String>>,
}

impl VenueQuery {
    pub fn new(config: ClientConfig, token: Signal<Option<String>>) -> Self {
        Self {
            cache: StoredValue::new(VenueQueryCache::new()),
            state: RwSignal::new(QueryState::default()),
            config: StoredValue::new(config),
            token,
        }
    }

    pub fn state(&self) -> ReadSignal<QueryState> {
        self.state.read_only()
    }

    pub fn set_target(&self, target: QueryTarget) {
        let request = self.cache.try_update_value(|c| c.set_target(target)).flatten();
        self.publish();
        self.dispatch(request);
    }

    pub fn refetch(&self) {
        let request = self.cache.try_update_value(|c| c.refetch()).flatten();
        self.publish();
        self.dispatch(request);
    }

    pub fn invalidate_all(&self) {
        let request = self.cache.try_update_value(|c| c.invalidate_all()).flatten();
        self.publish();
        self.dispatch(request);
    }

    fn publish(&self) {
        if let Some(view) = self.cache.try_with_value(|c| c.view()) {
            self.state.set(view);
        }
    }

    fn dispatch(&self, request: Option<FetchRequest>) {
        let Some(request) = request else {
            return;
        };
        let Some(config) = self.config.try_get_value() else {
            return;
        };
        let source = VenueSource::from_config(&config).with_token(self.token.get_untracked());
        let this = *self;
        spawn_local(async move {
            let result = source.fetch_all(request.bounds).await;
            if let Err(err) = &result {
                log::warn(&format!("venue fetch failed: {err}"));
            }
            let applied = this
                .cache
                .try_update_value(|c| c.resolve(&request, result))
                .unwrap_or(false);
            if applied {
                this.publish();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use venuemap_shared::mock::fixture_venues;

    const B1: BoundingBox = BoundingBox::new(21.15, 20.9, 106.0, 105.6);
    const B2: BoundingBox = BoundingBox::new(11.0, 10.5, 107.0, 106.5);

    fn venues(ids: &[&str]) -> Vec<Venue> {
        let fixtures = fixture_venues();
        ids.iter()
            .map(|id| {
                let mut venue = fixtures[0].clone();
                venue.id = id.to_string();
                venue
            })
            .collect()
    }

    fn ids(state: &QueryState) -> Vec<String> {
        state.venues.iter().map(|v| v.id.clone()).collect()
    }

    #[test]
    fn first_fetch_reports_loading() {
        let mut cache = VenueQueryCache::new();
        let request = cache.set_target(QueryTarget::Within(B1)).unwrap();
        assert_eq!(request.bounds, Some(B1));

        let view = cache.view();
        assert!(view.is_loading);
        assert!(view.is_fetching);
        assert!(view.venues.is_empty());

        cache.resolve(&request, Ok(venues(&["a", "b"])));
        let view = cache.view();
        assert!(!view.is_loading);
        assert!(!view.is_fetching);
        assert_eq!(ids(&view), vec!["a", "b"]);
    }

    #[test]
    fn previous_results_stay_visible_while_new_key_loads() {
        let mut cache = VenueQueryCache::new();
        let r1 = cache.set_target(QueryTarget::Within(B1)).unwrap();
        cache.resolve(&r1, Ok(venues(&["a"])));

        let r2 = cache.set_target(QueryTarget::Within(B2)).unwrap();
        let view = cache.view();
        assert!(view.is_fetching);
        assert!(view.is_placeholder);
        assert!(!view.is_loading);
        assert_eq!(ids(&view), vec!["a"]);

        cache.resolve(&r2, Ok(venues(&["z"])));
        let view = cache.view();
        assert!(!view.is_placeholder);
        assert_eq!(ids(&view), vec!["z"]);
    }

    #[test]
    fn repeated_target_attaches_to_in_flight_fetch() {
        let mut cache = VenueQueryCache::new();
        let r1 = cache.set_target(QueryTarget::Within(B1)).unwrap();
        assert_eq!(cache.set_target(QueryTarget::Within(B1)), None);

        cache.set_target(QueryTarget::Within(B2)).unwrap();
        // Back to B1 while its first fetch is still running.
        assert_eq!(cache.set_target(QueryTarget::Within(B1)), None);
        assert!(cache.resolve(&r1, Ok(venues(&["a"]))));
        assert_eq!(ids(&cache.view()), vec!["a"]);
    }

    #[test]
    fn late_result_for_old_key_does_not_replace_current_view() {
        let mut cache = VenueQueryCache::new();
        let r1 = cache.set_target(QueryTarget::Within(B1)).unwrap();
        let r2 = cache.set_target(QueryTarget::Within(B2)).unwrap();

        cache.resolve(&r2, Ok(venues(&["new"])));
        cache.resolve(&r1, Ok(venues(&["old"])));
        assert_eq!(ids(&cache.view()), vec!["new"]);

        // The old slot is filled and reused when the viewport comes back.
        cache.set_target(QueryTarget::Within(B1));
        let view = cache.view();
        assert_eq!(ids(&view), vec!["old"]);
        assert!(view.is_fetching);
        assert!(!view.is_placeholder);
    }

    #[test]
    fn disabled_target_issues_nothing() {
        let mut cache = VenueQueryCache::new();
        assert_eq!(cache.set_target(QueryTarget::Disabled), None);
        assert_eq!(cache.refetch(), None);
        assert_eq!(cache.invalidate_all(), None);
        assert_eq!(cache.view(), QueryState::default());
    }

    #[test]
    fn server_error_is_exposed_without_placeholder() {
        let mut cache = VenueQueryCache::new();
        let r1 = cache.set_target(QueryTarget::Within(B1)).unwrap();
        cache.resolve(&r1, Ok(venues(&["a"])));
        let r2 = cache.set_target(QueryTarget::Within(B2)).unwrap();
        let err = ApiError::Status {
            status: 500,
            message: String::new(),
        };
        cache.resolve(&r2, Err(err.clone()));

        let view = cache.view();
        assert_eq!(view.error, Some(err));
        assert!(view.venues.is_empty());
        assert!(!view.is_loading);
    }

    #[test]
    fn retry_after_error_shows_previous_results_while_fetching() {
        let mut cache = VenueQueryCache::new();
        let r1 = cache.set_target(QueryTarget::Within(B1)).unwrap();
        cache.resolve(&r1, Ok(venues(&["a"])));
        let r2 = cache.set_target(QueryTarget::Within(B2)).unwrap();
        cache.resolve(
            &r2,
            Err(ApiError::Status {
                status: 500,
                message: String::new(),
            }),
        );

        cache.refetch().unwrap();
        let view = cache.view();
        assert!(!view.is_loading);
        assert!(view.is_fetching);
        assert!(view.is_placeholder);
        assert_eq!(view.error, None);
        assert_eq!(ids(&view), vec!["a"]);
    }

    #[test]
    fn returning_to_failed_key_keeps_last_results_visible() {
        let mut cache = VenueQueryCache::new();
        let r1 = cache.set_target(QueryTarget::Within(B1)).unwrap();
        cache.resolve(&r1, Ok(venues(&["a"])));
        let r2 = cache.set_target(QueryTarget::Within(B2)).unwrap();
        cache.resolve(&r2, Err(ApiError::Decode("bad".into())));
        let b3 = BoundingBox::new(16.1, 15.9, 108.3, 108.1);
        let r3 = cache.set_target(QueryTarget::Within(b3)).unwrap();
        cache.resolve(&r3, Ok(venues(&["c"])));

        assert!(cache.set_target(QueryTarget::Within(B2)).is_some());
        let view = cache.view();
        assert!(!view.is_loading);
        assert_eq!(view.error, None);
        assert_eq!(ids(&view), vec!["c"]);
    }

    #[test]
    fn refetch_after_error_clears_it_on_success() {
        let mut cache = VenueQueryCache::new();
        let r1 = cache.set_target(QueryTarget::All).unwrap();
        cache.resolve(&r1, Err(ApiError::Decode("bad".into())));
        let r2 = cache.refetch().unwrap();
        assert_eq!(cache.refetch(), None);
        cache.resolve(&r2, Ok(venues(&["a"])));
        assert_eq!(cache.view().error, None);
    }

    #[test]
    fn invalidation_supersedes_in_flight_fetch() {
        let mut cache = VenueQueryCache::new();
        let r1 = cache.set_target(QueryTarget::All).unwrap();
        let r2 = cache.invalidate_all().unwrap();
        assert_ne!(r1.id, r2.id);

        assert!(!cache.resolve(&r1, Ok(venues(&["before"]))));
        assert!(cache.resolve(&r2, Ok(venues(&["after"]))));
        assert_eq!(ids(&cache.view()), vec!["after"]);
    }

    #[test]
    fn invalidation_keeps_data_visible_during_refetch() {
        let mut cache = VenueQueryCache::new();
        let r1 = cache.set_target(QueryTarget::All).unwrap();
        cache.resolve(&r1, Ok(venues(&["a"])));
        cache.invalidate_all().unwrap();
        let view = cache.view();
        assert!(view.is_fetching);
        assert_eq!(ids(&view), vec!["a"]);
    }

    #[test]
    fn equal_bounds_share_a_key() {
        let mut cache = VenueQueryCache::new();
        cache.set_target(QueryTarget::Within(B1)).unwrap();
        cache.set_target(QueryTarget::Disabled);
        let copy = BoundingBox::new(21.15, 20.9, 106.0, 105.6);
        assert_eq!(cache.set_target(QueryTarget::Within(copy)), None);
    }
}
