//! Response envelope and user profile wrappers.
//!
//! # Design
//! Every backend reply is expected to carry a `success` flag plus optional
//! `data`, `user`, `message` and `token` fields, but the client does not
//! enforce that shape. `Envelope` and `UserProfile` hold the parsed JSON
//! exactly as received and expose lenient accessors: a missing or
//! wrongly-typed field reads as `None`, never as an error. Serializing
//! either type yields the original JSON unchanged.
//!
//! `Envelope::into_data` turns the `success` flag into a `Result`, which is
//! how callers are expected to consume it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// The `{success, data, message, ...}` reply every endpoint returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope {
    raw: Value,
}

impl Envelope {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// `true` only when the reply carries `"success": true`.
    pub fn success(&self) -> bool {
        self.raw.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    /// `data`, unless absent or `null`.
    pub fn data(&self) -> Option<&Value> {
        self.raw.get("data").filter(|v| !v.is_null())
    }

    pub fn message(&self) -> Option<&str> {
        self.raw.get("message").and_then(Value::as_str)
    }

    pub fn token(&self) -> Option<&str> {
        self.raw.get("token").and_then(Value::as_str)
    }

    /// `user`, unless absent or `null`.
    pub fn user(&self) -> Option<UserProfile> {
        self.raw
            .get("user")
            .filter(|v| !v.is_null())
            .map(|v| UserProfile::new(v.clone()))
    }

    /// Any top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    pub fn into_value(self) -> Value {
        self.raw
    }

    /// `data` on success (`Value::Null` when absent), `Rejected` otherwise.
    pub fn into_data(self) -> Result<Value, ApiError> {
        if !self.success() {
            return Err(ApiError::Rejected(self.rejection_message()));
        }
        match self.raw {
            Value::Object(mut map) => Ok(map.remove("data").unwrap_or(Value::Null)),
            _ => Ok(Value::Null),
        }
    }

    /// Deserialize `data` into `T` after checking `success`.
    pub fn data_as<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let data = self.into_data()?;
        serde_json::from_value(data).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub(crate) fn rejection_message(&self) -> String {
        self.message()
            .map(str::to_string)
            .unwrap_or_else(|| "request was not successful".to_string())
    }
}

impl From<Value> for Envelope {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

/// Cached snapshot of the signed-in user, kept exactly as the server sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile {
    raw: Value,
}

const ID_FIELDS: [&str; 5] = ["id", "_id", "userId", "studentId", "staffId"];

impl UserProfile {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }

    pub fn role(&self) -> Option<&str> {
        self.str_field("role")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_field("email")
    }

    pub fn phone(&self) -> Option<&str> {
        self.str_field("phone")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// First identifier field present, rendered as a string.
    pub fn id(&self) -> Option<String> {
        ID_FIELDS.iter().find_map(|key| match self.raw.get(*key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    pub fn into_value(self) -> Value {
        self.raw
    }
}

impl From<Value> for UserProfile {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

/// Credentials sent to `/auth/login`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub user_id: &'a str,
    pub password: &'a str,
}

/// Push-notification device registration payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistration<'a> {
    pub device_token: &'a str,
    pub platform: &'a str,
}
