//! Finseer Server Client
//!
//! HTTP client for the parts of the Jellyfin API used around playback.
//!
//! # Features
//!
//! - **Authentication**: Login by name, token validation, `MediaBrowser` authorization header
//! - **Items**: Fetch a single item and its playback info
//! - **Streaming**: Resolve progressive or transcoded (HLS) play URLs
//!
//! `JellyfinClient` implements [`finseer_core::StreamResolver`], so it can be
//! handed straight to a playback backend.
//!
//! # Example
//!
//! ```no_run
//! use finseer_core::{ItemId, StreamResolver};
//! use finseer_server_client::{JellyfinClient, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = JellyfinClient::new(ServerConfig::new("https://jellyfin.example.com"))?;
//!     client.authenticate_by_name("alice", "secret").await?;
//!
//!     let handle = client.streaming().await?;
//!     let item = handle.client().get_item(&ItemId::new("abc")).await?;
//!     let stream = client.resolve(&item, None).await?;
//!     println!("Playing {} via {:?}", stream.url, stream.delivery_mode());
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod error;
mod streaming;
mod types;

// Re-export main types
pub use client::{JellyfinClient, StreamingClientHandle};
pub use error::{Result, ServerClientError};
pub use types::{
    AuthenticationResult, PlaybackInfoResponse, PublicSystemInfo, ServerConfig, UserDto,
    DEFAULT_TIMEOUT,
};

// Re-export sub-clients for direct use if needed
pub use auth::AuthClient;
pub use streaming::{progressive_url, stream_for_source, StreamingClient};
