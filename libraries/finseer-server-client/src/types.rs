//! Types for Jellyfin API requests and responses.

use finseer_core::{MediaSourceInfo, UserId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for connecting to a Jellyfin server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the server (e.g., "https://jellyfin.example.com")
    pub url: String,
    /// Current access token (if authenticated)
    pub access_token: Option<String>,
    /// User the token belongs to
    pub user_id: Option<UserId>,
    /// Client identity reported in the authorization header
    pub client_name: String,
    pub client_version: String,
    pub device_name: String,
    pub device_id: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ServerConfig {
    /// Create a new server config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
            user_id: None,
            client_name: "Finseer".into(),
            client_version: env!("CARGO_PKG_VERSION").into(),
            device_name: "Finseer".into(),
            device_id: "finseer".into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a config with a saved token.
    pub fn with_token(
        url: impl Into<String>,
        access_token: impl Into<String>,
        user_id: Option<UserId>,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            user_id,
            ..Self::new(url)
        }
    }

    /// Override the device identity.
    pub fn with_device(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.device_name = name.into();
        self.device_id = id.into();
        self
    }

    /// Value of the `Authorization` header
    ///
    /// With a token this is the bare token form; before login the client
    /// identifies itself instead.
    pub fn authorization_header(&self) -> String {
        match &self.access_token {
            Some(token) => format!("MediaBrowser Token=\"{}\"", token),
            None => format!(
                "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\"",
                self.client_name, self.device_name, self.device_id, self.client_version
            ),
        }
    }
}

// =============================================================================
// System Types
// =============================================================================

/// Public server information (no authentication required).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublicSystemInfo {
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub id: String,
}

// =============================================================================
// Authentication Types
// =============================================================================

/// Request body for authenticate-by-name.
#[derive(Debug, Serialize)]
pub struct AuthenticateByNameRequest {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Pw")]
    pub password: String,
}

/// User as reported by the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
}

/// Response from a successful authentication.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub user: UserDto,
    pub access_token: String,
    #[serde(default)]
    pub server_id: Option<String>,
}

// =============================================================================
// Playback Types
// =============================================================================

/// Response from `/Items/{id}/PlaybackInfo`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaybackInfoResponse {
    #[serde(default)]
    pub media_sources: Vec<MediaSourceInfo>,
    #[serde(default)]
    pub play_session_id: Option<String>,
    /// Set by the server when playback is refused
    #[serde(default)]
    pub error_code: Option<String>,
}
