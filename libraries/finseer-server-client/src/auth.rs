//! Authentication methods for Jellyfin.

use crate::error::{Result, ServerClientError};
use crate::types::{AuthenticateByNameRequest, AuthenticationResult, UserDto};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use tracing::{debug, info, warn};

/// Authentication client for Jellyfin.
pub struct AuthClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    authorization: &'a str,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, authorization: &'a str) -> Self {
        Self {
            http,
            base_url,
            authorization,
        }
    }

    /// Authenticate with username and password.
    ///
    /// Returns the access token and user on success.
    pub async fn authenticate_by_name(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult> {
        let url = format!("{}/Users/AuthenticateByName", self.base_url);
        debug!(url = %url, username = %username, "Attempting login");

        let request = AuthenticateByNameRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.authorization)
            .json(&request)
            .send()
            .await
            .map_err(ServerClientError::from_send)?;

        let status = response.status();

        if status.is_success() {
            let result: AuthenticationResult = response.json().await.map_err(|e| {
                ServerClientError::ParseError(format!("Failed to parse login response: {}", e))
            })?;

            info!(
                username = %result.user.name,
                user_id = %result.user.id,
                "Login successful"
            );

            Ok(result)
        } else if status.as_u16() == 401 {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Login failed: invalid credentials");
            Err(ServerClientError::AuthFailed(
                "Invalid username or password".to_string(),
            ))
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }

    /// Get the user owning the current token.
    pub async fn get_current_user(&self) -> Result<UserDto> {
        let url = format!("{}/Users/Me", self.base_url);
        debug!(url = %url, "Getting current user info");

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, self.authorization)
            .send()
            .await
            .map_err(ServerClientError::from_send)?;

        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                ServerClientError::ParseError(format!("Failed to parse user info: {}", e))
            })
        } else if status.as_u16() == 401 {
            Err(ServerClientError::AuthRequired)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }

    /// Check whether the current token is still accepted.
    pub async fn validate_token(&self) -> Result<bool> {
        match self.get_current_user().await {
            Ok(_) => Ok(true),
            Err(ServerClientError::AuthRequired) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
