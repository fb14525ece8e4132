//! Authenticated request pipeline and session operations.
//!
//! # Design
//! Every backend call flows through `SchoolClient::request`, which is split
//! into two deterministic halves around the transport:
//!
//! - `build_request` joins the path to the base URL, merges headers
//!   (`Content-Type: application/json` always wins, caller `Authorization`
//!   is dropped), injects the bearer token, and serializes the body for
//!   non-GET verbs.
//! - `parse_response` parses the body as JSON and maps non-2xx statuses to
//!   `ApiError::Request`, preferring the server's `message`.
//!
//! The client holds no mutable state of its own. The session lives in the
//! injected `KeyValueStore`, read once per request.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::image::ImageSource;
use crate::session::{Session, SessionStore};
use crate::store::KeyValueStore;
use crate::types::{Envelope, LoginRequest, UserProfile};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Per-call options for `SchoolClient::request`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self::with_method(HttpMethod::Delete)
    }

    pub fn post<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        Self::with_method(HttpMethod::Post).json(body)
    }

    pub fn put<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        Self::with_method(HttpMethod::Put).json(body)
    }

    pub fn with_method(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body =
            Some(serde_json::to_value(body).map_err(|e| ApiError::Serialization(e.to_string()))?);
        Ok(self)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query(mut self, query: Query) -> Self {
        self.query = query.into_pairs();
        self
    }
}

/// Query-string pairs. Unset filters are skipped rather than sent empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opt<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.pairs.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Emit `key=true` only when `enabled`.
    pub fn flag(mut self, key: &str, enabled: bool) -> Self {
        if enabled {
            self.pairs.push((key.to_string(), "true".to_string()));
        }
        self
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

/// Authenticated client for the SchoolHub REST backend.
///
/// Cheap to clone; clones share the transport and the session store.
#[derive(Clone)]
pub struct SchoolClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    sessions: SessionStore,
}

impl SchoolClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            config,
            transport,
            sessions: SessionStore::new(store),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    pub fn build_request(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ApiError::InvalidRequest("path must not be empty".to_string()));
        }
        let url = if path.starts_with('/') {
            format!("{}{}", self.config.base_url, path)
        } else {
            format!("{}/{}", self.config.base_url, path)
        };

        let mut headers = vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())];
        headers.extend(options.headers.into_iter().filter(|(name, _)| {
            !name.eq_ignore_ascii_case("content-type") && !name.eq_ignore_ascii_case("authorization")
        }));
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let body = match (options.method, options.body) {
            (HttpMethod::Get, Some(_)) => {
                debug!(%url, "dropping body on GET request");
                None
            }
            (_, Some(body)) => Some(
                serde_json::to_string(&body).map_err(|e| ApiError::Serialization(e.to_string()))?,
            ),
            (_, None) => None,
        };

        Ok(HttpRequest {
            method: options.method,
            url,
            query: options.query,
            headers,
            body,
        })
    }

    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let parsed = serde_json::from_str::<Value>(&response.body);

        if !response.is_success() {
            let message = parsed
                .ok()
                .as_ref()
                .and_then(|v| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}: {}", response.status, response.status_text));
            warn!(status = response.status, %message, "request failed");
            return Err(ApiError::Request {
                status: response.status,
                message,
            });
        }

        parsed.map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Send `options` to `path` with the stored bearer token, if any.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let token = self.sessions.token().await?;
        let request = self.build_request(path, options, token.as_deref())?;
        debug!(
            method = %request.method,
            url = %request.url,
            authenticated = token.is_some(),
            "dispatching request"
        );
        let response = self.transport.execute(request).await?;
        self.parse_response(response)
    }

    /// `request`, typed as an `Envelope`.
    pub async fn call(&self, path: &str, options: RequestOptions) -> Result<Envelope, ApiError> {
        Ok(Envelope::new(self.request(path, options).await?))
    }

    /// Authenticate and persist the returned token and user together.
    /// Nothing is written unless the whole exchange succeeds.
    pub async fn login(&self, id: &str, password: &str) -> Result<Envelope, ApiError> {
        let options = RequestOptions::post(&LoginRequest {
            user_id: id,
            password,
        })?;
        let envelope = self.call("/auth/login", options).await?;
        if !envelope.success() {
            return Err(ApiError::Rejected(envelope.rejection_message()));
        }
        let session = match (envelope.token(), envelope.user()) {
            (Some(token), Some(user)) if !token.is_empty() => Session {
                token: token.to_string(),
                user,
            },
            _ => {
                return Err(ApiError::Rejected(
                    "login response is missing token or user".to_string(),
                ))
            }
        };
        self.sessions.save(&session).await?;
        info!(user_id = ?session.user.id(), "session stored");
        Ok(envelope)
    }

    /// Clear the stored session. Never fails; a storage error is logged
    /// by the session store.
    pub async fn logout(&self) {
        if self.sessions.clear().await {
            info!("session cleared");
        }
    }

    /// Forward registration data verbatim. Does not sign the user in.
    pub async fn register<B: Serialize + ?Sized>(&self, user_data: &B) -> Result<Envelope, ApiError> {
        self.call("/auth/register", RequestOptions::post(user_data)?)
            .await
    }

    /// Cached user snapshot without touching the network.
    pub async fn stored_session(&self) -> Option<UserProfile> {
        match self.sessions.user().await {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable stored session");
                None
            }
        }
    }

    pub async fn stored_token(&self) -> Option<String> {
        match self.sessions.token().await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable stored token");
                None
            }
        }
    }

    pub async fn get_profile(&self) -> Result<Envelope, ApiError> {
        self.call("/auth/profile", RequestOptions::get()).await
    }

    /// PUT a profile patch. With `refresh_session_on_profile_update`, a
    /// successful reply's `user` (or object `data`) replaces the cached
    /// snapshot.
    pub async fn update_profile<B: Serialize + ?Sized>(
        &self,
        patch: &B,
    ) -> Result<Envelope, ApiError> {
        let envelope = self
            .call("/auth/profile", RequestOptions::put(patch)?)
            .await?;
        if self.config.refresh_session_on_profile_update && envelope.success() {
            self.refresh_stored_user(&envelope).await?;
        }
        Ok(envelope)
    }

    async fn refresh_stored_user(&self, envelope: &Envelope) -> Result<(), ApiError> {
        let user = match (envelope.user(), envelope.data()) {
            (Some(user), _) => user,
            (None, Some(data @ Value::Object(_))) => UserProfile::new(data.clone()),
            _ => return Ok(()),
        };
        self.sessions.save_user(&user).await?;
        info!("stored profile refreshed");
        Ok(())
    }

    /// Encode `image` as a data URI and send it as JSON.
    pub async fn upload_profile_image(&self, image: &dyn ImageSource) -> Result<Envelope, ApiError> {
        let encoded = image.to_base64().await?;
        let body = serde_json::json!({ "image": encoded });
        self.call("/auth/profile/image", RequestOptions::post(&body)?)
            .await
    }

    pub async fn upload_file(
        &self,
        file: &dyn ImageSource,
        category: &str,
    ) -> Result<Envelope, ApiError> {
        let encoded = file.to_base64().await?;
        let body = serde_json::json!({ "file": encoded, "category": category });
        self.call("/upload", RequestOptions::post(&body)?).await
    }
}
