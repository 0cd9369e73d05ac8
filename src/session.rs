//! Authenticated-user context shared by the API client and its callers.
//!
//! The token is persisted under [`TOKEN_KEY`]; the user profile lives in memory only
//! and has to be re-fetched after a restart.

use log::{info, warn};
use std::cell::RefCell;
use std::rc::Rc;

use crate::models::energy::User;
use crate::storage::KeyValueStore;

pub const TOKEN_KEY: &str = "token";

pub type SharedSession = Rc<RefCell<Session>>;

pub struct Session {
    token: String,
    user: Option<User>,
    store: Rc<dyn KeyValueStore>,
}

impl Session {
    /// Build a session from whatever token the store holds. A store failure yields a
    /// logged-out session.
    pub fn hydrate(store: Rc<dyn KeyValueStore>) -> Self {
        let token = match store.get_item(TOKEN_KEY) {
            Ok(Some(t)) => t.trim().to_string(),
            Ok(None) => String::new(),
            Err(e) => {
                warn!("Session: failed to load persisted token: {}", e);
                String::new()
            }
        };
        Session {
            token,
            user: None,
            store,
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Rc::new(RefCell::new(self))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Presence check only; expiry and signature are the server's business.
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    pub(crate) fn bearer(&self) -> Option<String> {
        if self.is_authenticated() {
            Some(self.token.clone())
        } else {
            None
        }
    }

    /// Install a freshly issued token and profile, persisting the token.
    pub(crate) fn establish(&mut self, token: String, user: User) {
        if let Err(e) = self.store.set_item(TOKEN_KEY, &token) {
            warn!("Session: failed to persist token: {}", e);
        }
        info!("Session: logged in as user {} ({})", user.id.0, user.email);
        self.token = token;
        self.user = Some(user);
    }

    pub(crate) fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    /// Client-side teardown only; the server is not told.
    pub fn logout(&mut self) {
        self.token.clear();
        self.user = None;
        if let Err(e) = self.store.remove_item(TOKEN_KEY) {
            warn!("Session: failed to remove persisted token: {}", e);
        }
        info!("Session: logged out");
    }

    #[cfg(test)]
    pub(crate) fn set_token_for_test(&mut self, token: &str) {
        self.token = token.to_string();
    }
}
