//! Main Jellyfin client.

use crate::auth::AuthClient;
use crate::error::{Result, ServerClientError};
use crate::streaming::StreamingClient;
use crate::types::{AuthenticationResult, PublicSystemInfo, ServerConfig};
use async_trait::async_trait;
use finseer_core::{MediaItem, MediaSourceId, StreamInfo, StreamResolver, UserId};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Main client for interacting with a Jellyfin server.
///
/// The client handles authentication and provides item lookup and stream
/// resolution for the playback core.
///
/// # Example
///
/// ```no_run
/// use finseer_server_client::{JellyfinClient, ServerConfig};
///
/// # async fn run() -> finseer_server_client::Result<()> {
/// let client = JellyfinClient::new(ServerConfig::new("https://jellyfin.example.com"))?;
/// let login = client.authenticate_by_name("alice", "secret").await?;
/// println!("Logged in as {}", login.user.name);
/// # Ok(())
/// # }
/// ```
pub struct JellyfinClient {
    http: Client,
    config: Arc<RwLock<ServerConfig>>,
}

impl JellyfinClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        // Validate URL
        if config.url.is_empty() {
            return Err(ServerClientError::InvalidUrl("URL cannot be empty".into()));
        }

        // Parse and normalize URL
        let url = config.url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ServerClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        url::Url::parse(&url)?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!(
                "{}/{} ({})",
                config.client_name, config.client_version, config.device_name
            ))
            .build()
            .map_err(ServerClientError::Request)?;

        Ok(Self {
            http,
            config: Arc::new(RwLock::new(ServerConfig { url, ..config })),
        })
    }

    /// Get the server URL.
    pub async fn url(&self) -> String {
        self.config.read().await.url.clone()
    }

    /// Check if the client has an access token.
    pub async fn is_authenticated(&self) -> bool {
        self.config.read().await.access_token.is_some()
    }

    /// Current `Authorization` header value.
    pub async fn authorization_header(&self) -> String {
        self.config.read().await.authorization_header()
    }

    /// Test the connection to the server.
    ///
    /// This does not require authentication.
    pub async fn test_connection(&self) -> Result<PublicSystemInfo> {
        let url = format!("{}/System/Info/Public", self.url().await);
        debug!(url = %url, "Testing server connection");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(ServerClientError::from_send)?;

        let status = response.status();

        if status.is_success() {
            let info: PublicSystemInfo = response.json().await.map_err(|e| {
                ServerClientError::ParseError(format!("Failed to parse server info: {}", e))
            })?;

            info!(
                name = %info.server_name,
                version = %info.version,
                "Connected to server"
            );

            Ok(info)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }

    /// Login with username and password.
    ///
    /// On success, the access token and user id are stored for subsequent requests.
    pub async fn authenticate_by_name(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult> {
        let config = self.config.read().await;
        let url = config.url.clone();
        let authorization = config.authorization_header();
        drop(config);

        let auth_client = AuthClient::new(&self.http, &url, &authorization);
        let response = auth_client.authenticate_by_name(username, password).await?;

        let mut config = self.config.write().await;
        config.access_token = Some(response.access_token.clone());
        config.user_id = Some(response.user.id.clone());

        Ok(response)
    }

    /// Set a token directly (e.g., from saved login preferences).
    pub async fn set_token(&self, access_token: String, user_id: Option<UserId>) {
        let mut config = self.config.write().await;
        config.access_token = Some(access_token);
        config.user_id = user_id;
    }

    /// Get the current token.
    pub async fn access_token(&self) -> Option<String> {
        self.config.read().await.access_token.clone()
    }

    /// Clear the stored token (logout).
    pub async fn logout(&self) {
        let mut config = self.config.write().await;
        config.access_token = None;
        config.user_id = None;
        info!("Logged out");
    }

    /// Validate the current access token.
    pub async fn validate_token(&self) -> Result<bool> {
        let config = self.config.read().await;
        if config.access_token.is_none() {
            return Ok(false);
        }
        let url = config.url.clone();
        let authorization = config.authorization_header();
        drop(config);

        let auth_client = AuthClient::new(&self.http, &url, &authorization);
        auth_client.validate_token().await
    }

    /// Get a handle for item and stream requests.
    ///
    /// Returns an error if not authenticated.
    pub async fn streaming(&self) -> Result<StreamingClientHandle> {
        let config = self.config.read().await;
        if config.access_token.is_none() {
            return Err(ServerClientError::AuthRequired);
        }

        Ok(StreamingClientHandle {
            http: self.http.clone(),
            url: config.url.clone(),
            authorization: config.authorization_header(),
            user_id: config.user_id.as_ref().map(|id| id.as_str().to_string()),
        })
    }
}

#[async_trait]
impl StreamResolver for JellyfinClient {
    async fn resolve(
        &self,
        item: &MediaItem,
        media_source_id: Option<&MediaSourceId>,
    ) -> finseer_core::Result<StreamInfo> {
        let handle = self.streaming().await?;
        Ok(handle
            .client()
            .resolve_stream(item, media_source_id)
            .await?)
    }
}

/// Handle for item and stream operations.
///
/// This is returned by `JellyfinClient::streaming()` and carries a snapshot
/// of the credentials taken when it was created.
pub struct StreamingClientHandle {
    http: Client,
    url: String,
    authorization: String,
    user_id: Option<String>,
}

impl StreamingClientHandle {
    /// Get the streaming client.
    pub fn client(&self) -> StreamingClient<'_> {
        StreamingClient::new(
            &self.http,
            &self.url,
            &self.authorization,
            self.user_id.as_deref(),
        )
    }
}
