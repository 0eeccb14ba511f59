//! Stored login credentials.

use std::sync::Arc;

use listingdesk_api_types::{LoginResponse, User};
use tracing::debug;

use crate::application::storage::{KeyValueStore, StoreError, keys};

#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn KeyValueStore>,
}

impl Credentials {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn token(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get(keys::TOKEN)?
            .filter(|token| !token.trim().is_empty()))
    }

    pub fn set_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(keys::TOKEN, token.trim())
    }

    /// Persist the access token and user profile from a successful login.
    pub fn save_login(&self, login: &LoginResponse) -> Result<(), StoreError> {
        self.set_token(&login.tokens.access)?;
        self.save_user(&login.user)
    }

    pub fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(user).map_err(|err| StoreError::Corrupt {
            path: keys::USER.to_string(),
            message: err.to_string(),
        })?;
        self.store.set(keys::USER, &encoded)
    }

    /// The stored profile. An unreadable value is treated as absent.
    pub fn user(&self) -> Result<Option<User>, StoreError> {
        let Some(raw) = self.store.get(keys::USER)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                debug!(error = %err, "ignoring unreadable stored user");
                Ok(None)
            }
        }
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear(keys::TOKEN)?;
        self.store.clear(keys::USER)
    }
}
