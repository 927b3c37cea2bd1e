//! Preference persistence boundary
//!
//! Login and third-party credentials are kept in a secure key-value store
//! chosen by the runtime context (embedded app store or browser secure
//! storage). The stores themselves are external; this module fixes the
//! keys, the value shapes and the trait the rest of the client talks to.

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Key for saved login preferences
pub const LOGIN_PREFERENCES_KEY: &str = "login-preferences";

/// Key for saved Seerr connection data
pub const SEERR_DATA_KEY: &str = "seerr-config";

/// Secure key-value store
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Read a raw value
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a raw value, replacing any previous one
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Read and decode a typed value
///
/// A stored value that no longer matches `T` is treated as absent.
pub async fn load<T: DeserializeOwned>(store: &dyn PreferenceStore, key: &str) -> Result<Option<T>> {
    let Some(value) = store.get(key).await? else {
        return Ok(None);
    };

    // Browser storage may hold the JSON as a string
    let value = match value {
        Value::String(raw) => match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(_) => return Ok(None),
        },
        other => other,
    };

    Ok(serde_json::from_value(value).ok())
}

/// Encode and write a typed value
pub async fn save<T: Serialize + Sync>(
    store: &dyn PreferenceStore,
    key: &str,
    value: &T,
) -> Result<()> {
    store.set(key, serde_json::to_value(value)?).await
}

/// Where the client is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeContext {
    /// Embedded desktop/mobile shell with its own app store
    EmbeddedApp,
    /// Plain browser with secure local storage
    Browser,
}

/// Store selection by runtime context
#[derive(Clone)]
pub struct PreferenceBackends {
    pub embedded: Arc<dyn PreferenceStore>,
    pub browser: Arc<dyn PreferenceStore>,
}

impl PreferenceBackends {
    /// Store to use in `context`
    pub fn for_context(&self, context: RuntimeContext) -> Arc<dyn PreferenceStore> {
        match context {
            RuntimeContext::EmbeddedApp => Arc::clone(&self.embedded),
            RuntimeContext::Browser => Arc::clone(&self.browser),
        }
    }
}

/// Saved login form values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPreferences {
    pub username: Option<String>,
    pub server_url: Option<String>,
}

/// How the client authenticates against Seerr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeerrAuthType {
    ApiKey,
    JellyfinUser,
    LocalUser,
}

/// Saved Seerr connection data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeerrAuthData {
    pub server_url: String,
    pub auth_type: SeerrAuthType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Process-local store, used in tests and as a fallback
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    values: RwLock<HashMap<String, Value>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self
            .values
            .read()
            .map_err(|e| CoreError::storage(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| CoreError::storage(e.to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| CoreError::storage(e.to_string()))?;
        values.remove(key);
        Ok(())
    }
}
