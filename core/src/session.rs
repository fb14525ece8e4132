//! Session persistence on top of a `KeyValueStore`.
//!
//! The session lives under two keys: `authToken` holds the raw bearer token
//! and `user` holds the profile JSON exactly as the server sent it. `SessionStore` is the
//! only code that writes either key.

use std::sync::Arc;

use tracing::warn;

use crate::error::ApiError;
use crate::store::KeyValueStore;
use crate::types::UserProfile;

pub const TOKEN_KEY: &str = "authToken";
pub const USER_KEY: &str = "user";

/// A signed-in user's token and profile snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write token and user in a single multi-key operation.
    pub async fn save(&self, session: &Session) -> Result<(), ApiError> {
        let user = serde_json::to_string(&session.user)
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.store
            .multi_set(&[(TOKEN_KEY, session.token.as_str()), (USER_KEY, user.as_str())])
            .await
    }

    /// Replace the cached profile, leaving the token untouched.
    pub async fn save_user(&self, user: &UserProfile) -> Result<(), ApiError> {
        let raw = serde_json::to_string(user).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.store.set(USER_KEY, &raw).await
    }

    pub async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(self
            .store
            .get(TOKEN_KEY)
            .await?
            .filter(|t| !t.is_empty()))
    }

    pub async fn user(&self) -> Result<Option<UserProfile>, ApiError> {
        match self.store.get(USER_KEY).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| ApiError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Best-effort removal of both keys. Failures are logged and reported
    /// as `false`, never returned.
    pub async fn clear(&self) -> bool {
        match self.store.multi_remove(&[TOKEN_KEY, USER_KEY]).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to clear stored session");
                false
            }
        }
    }
}
