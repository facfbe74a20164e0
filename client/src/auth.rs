use leptos::prelude::*;
use wasm_bindgen::JsCast;

use venuemap_shared::auth::AuthUser;

use crate::log;

const TOKEN_KEY: &str = "auth_token";
const USER_KEY: &str = "auth_user";
const COOKIE_MAX_AGE_SECS: u32 = 60 * 60 * 24 * 7;

/// Persisted copy of the session.
pub trait SessionStore {
    fn read_token(&self) -> Option<String>;
    /// Stored user record as raw JSON.
    fn read_user(&self) -> Option<String>;
    fn write(&self, token: &str, user_json: &str);
    fn erase(&self);
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<AuthUser>,
    /// The persisted copy has been read at least once.
    pub hydrated: bool,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.hydrated && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Session lifecycle over a [`SessionStore`]: `hydrate` once at startup,
/// `set` after login, `clear` on logout.
#[derive(Debug)]
pub struct Session<S> {
    store: S,
    state: SessionState,
}

impl<S: SessionStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[cfg(test)]
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn hydrate(&mut self) -> &SessionState {
        let token = self.store.read_token().filter(|t| !t.is_empty());
        let user = self
            .store
            .read_user()
            .and_then(|raw| match serde_json::from_str::<AuthUser>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    log::warn(&format!("ignoring stored user: {err}"));
                    None
                }
            });
        self.state = SessionState {
            token,
            user,
            hydrated: true,
        };
        &self.state
    }

    pub fn set(&mut self, token: String, user: AuthUser) {
        let user_json = serde_json::to_string(&user).unwrap_or_default();
        self.store.write(&token, &user_json);
        self.state = SessionState {
            token: Some(token),
            user: Some(user),
            hydrated: true,
        };
    }

    pub fn clear(&mut self) {
        self.store.erase();
        self.state = SessionState {
            hydrated: true,
            ..SessionState::default()
        };
    }
}

/// `localStorage` plus an `auth_token` cookie readable by the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSessionStore;

impl BrowserSessionStore {
    fn set_cookie(value: &str) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Ok(document) = document.dyn_into::<web_sys::HtmlDocument>() else {
            return;
        };
        let _ = document.set_cookie(value);
    }
}

impl SessionStore for BrowserSessionStore {
    fn read_token(&self) -> Option<String> {
        use gloo_storage::Storage;
        gloo_storage::LocalStorage::raw().get_item(TOKEN_KEY).ok().flatten()
    }

    fn read_user(&self) -> Option<String> {
        use gloo_storage::Storage;
        gloo_storage::LocalStorage::raw().get_item(USER_KEY).ok().flatten()
    }

    fn write(&self, token: &str, user_json: &str) {
        use gloo_storage::Storage;
        let storage = gloo_storage::LocalStorage::raw();
        let _ = storage.set_item(TOKEN_KEY, token);
        let _ = storage.set_item(USER_KEY, user_json);
        Self::set_cookie(&format!(
            "{TOKEN_KEY}={token}; path=/; max-age={COOKIE_MAX_AGE_SECS}; SameSite=Lax"
        ));
    }

    fn erase(&self) {
        use gloo_storage::Storage;
        gloo_storage::LocalStorage::delete(TOKEN_KEY);
        gloo_storage::LocalStorage::delete(USER_KEY);
        Self::set_cookie(&format!("{TOKEN_KEY}=; path=/; max-age=0"));
    }
}

/// Reactive session handle provided via context.
#[derive(Clone, Copy)]
pub struct AuthSession {
    session: StoredValue<Session<BrowserSessionStore>>,
    state: RwSignal<SessionState>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self {
            session: StoredValue::new(Session::new(BrowserSessionStore)),
            state: RwSignal::new(SessionState::default()),
        }
    }

    pub fn state(&self) -> ReadSignal<SessionState> {
        self.state.read_only()
    }

    pub fn token(&self) -> Signal<Option<String>> {
        let state = self.state;
        Signal::derive(move || state.with(|s| s.token.clone()))
    }

    pub fn hydrate(&self) {
        self.apply(|session| {
            session.hydrate();
        });
    }

    pub fn set(&self, token: String, user: AuthUser) {
        self.apply(move |session| session.set(token, user));
    }

    pub fn clear(&self) {
        self.apply(|session| session.clear());
    }

    fn apply(&self, change: impl FnOnce(&mut Session<BrowserSessionStore>)) {
        let next = self.session.try_update_value(|session| {
            change(session);
            session.state().clone()
        });
        if let Some(next) = next {
            self.state.set(next);
        }
    }
}
