//! Locator API HTTP client.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::location::LocationSample;
use crate::session::SessionError;

/// Login request body.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Login response body.
///
/// Servers that do not know the user omit `user_id`; the default of -1
/// marks the id as missing.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Identifier of the authenticated user, -1 when absent.
    #[serde(default = "missing_user_id")]
    pub user_id: i64,
}

fn missing_user_id() -> i64 {
    -1
}

/// HTTP client for the Locator REST API.
///
/// Constructed once per process and cloned into consumers; clones share
/// the underlying connection pool.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the given base URL.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Authenticate a user.
    ///
    /// Maps the transport outcomes onto the session error taxonomy:
    /// non-2xx is invalid credentials, an undecodable body is a malformed
    /// response, and anything below HTTP is a connection error.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, SessionError> {
        let response = self
            .http
            .post(format!("{}/login", self.base_url))
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(SessionError::Connection)?;

        if !response.status().is_success() {
            return Err(SessionError::InvalidCredentials(response.status()));
        }

        response
            .json::<LoginResponse>()
            .await
            .map_err(SessionError::MalformedResponse)
    }

    /// Submit one location sample for a user.
    ///
    /// Fire-and-forget contract: callers log the error and drop it, no
    /// retry and no queueing.
    pub async fn submit_location(&self, user_id: i64, sample: &LocationSample) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/send_location/{}", self.base_url, user_id))
            .json(sample)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Erro ao enviar localização: status {}", response.status());
        }

        Ok(())
    }
}

/// Submission seam between the tracker and the transport.
#[async_trait]
pub trait LocationSink: Send + Sync {
    /// Relay one sample for a user.
    async fn submit(&self, user_id: i64, sample: LocationSample) -> Result<()>;
}

#[async_trait]
impl LocationSink for ApiClient {
    async fn submit(&self, user_id: i64, sample: LocationSample) -> Result<()> {
        self.submit_location(user_id, &sample).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_deserialization() {
        let response: LoginResponse = serde_json::from_str(r#"{"user_id": 42}"#).unwrap();
        assert_eq!(response.user_id, 42);
    }

    #[test]
    fn test_login_response_missing_id_defaults() {
        let response: LoginResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(response.user_id, -1);
    }

    #[test]
    fn test_login_request_wire_shape() {
        let request = LoginRequest {
            username: "alice",
            password: "pw",
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"username":"alice","password":"pw"}"#);
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ApiClient::new("https://example.test/api/", Duration::from_secs(5));
        assert_eq!(client.base_url, "https://example.test/api");

        let client = ApiClient::new("https://example.test/api", Duration::from_secs(5));
        assert_eq!(client.base_url, "https://example.test/api");
    }

    #[test]
    fn test_submission_path() {
        let client = ApiClient::new("https://example.test/api", Duration::from_secs(5));
        let url = format!("{}/send_location/{}", client.base_url, 42);
        assert_eq!(url, "https://example.test/api/send_location/42");
    }
}
