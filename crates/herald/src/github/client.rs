//! Authenticated client for the notifications API.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::error::GitHubError;
use super::types::{Notification, ReleaseDetail};
use crate::config::{RunConfiguration, Secret};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport, basic_auth};

const USER_AGENT: &str = "herald";

const ACCEPT: &str = "application/vnd.github+json";

/// A decoded notification list together with the status it came back with.
#[derive(Debug, Clone)]
pub struct NotificationList {
    pub status: u16,
    pub notifications: Vec<Notification>,
}

/// Notifications API client.
///
/// Every call authenticates with HTTP basic auth (username + personal access
/// token). Calls are issued one at a time; the client holds no state between
/// them.
#[derive(Clone)]
pub struct NotificationClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    username: String,
    token: Secret,
}

impl NotificationClient {
    /// Create a client backed by reqwest, using the configured request timeout.
    pub fn new(config: &RunConfiguration) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(config.request_timeout)
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self::from_config_with_transport(config, Arc::new(transport)))
    }

    pub fn from_config_with_transport(
        config: &RunConfiguration,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::new_with_transport(
            &config.api_base,
            &config.username,
            config.token.clone(),
            transport,
        )
    }

    pub fn new_with_transport(
        api_base: &str,
        username: &str,
        token: Secret,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            api_base: api_base.trim_end_matches('/').to_string(),
            username: username.to_string(),
            token,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// URL of the authenticated user's notification list.
    pub fn notifications_url(&self) -> String {
        format!("{}/notifications", self.api_base)
    }

    /// URL that marks every notification in `full_name` as read.
    pub fn repository_notifications_url(&self, full_name: &str) -> String {
        format!("{}/repos/{}/notifications", self.api_base, full_name)
    }

    fn headers(&self) -> HttpHeaders {
        vec![
            ("Accept".to_string(), ACCEPT.to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            (
                "Authorization".to_string(),
                basic_auth(&self.username, self.token.expose()),
            ),
        ]
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: String,
        body: Vec<u8>,
    ) -> Result<HttpResponse, GitHubError> {
        let mut headers = self.headers();
        if !body.is_empty() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| GitHubError::Http(e.to_string()))?;

        if !response.is_success() {
            let message = String::from_utf8_lossy(&response.body).to_string();
            return Err(GitHubError::Api {
                status: response.status,
                message,
            });
        }

        Ok(response)
    }

    /// Make an authenticated GET request and decode the body.
    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<(u16, T), GitHubError> {
        let response = self.send(HttpMethod::Get, url, Vec::new()).await?;
        let status = response.status;
        let data = serde_json::from_slice(&response.body)
            .map_err(|source| GitHubError::Json { status, source })?;
        Ok((status, data))
    }

    /// Fetch the notification list.
    ///
    /// The body must be a JSON array of objects; anything else is a decode
    /// error.
    pub async fn list_notifications(&self) -> Result<NotificationList, GitHubError> {
        let (status, notifications) = self
            .get::<Vec<Notification>>(self.notifications_url())
            .await?;
        Ok(NotificationList {
            status,
            notifications,
        })
    }

    /// Fetch release metadata from a release notification's subject URL.
    ///
    /// Only URLs under the configured API root are followed, so credentials
    /// never leave for another host.
    pub async fn get_release(&self, url: &str) -> Result<ReleaseDetail, GitHubError> {
        if !self.is_api_url(url) {
            return Err(GitHubError::UntrustedUrl(url.to_string()));
        }
        let (_, detail) = self.get::<ReleaseDetail>(url.to_string()).await?;
        Ok(detail)
    }

    /// Mark every notification in a repository as read.
    ///
    /// Returns the response status on success.
    pub async fn mark_repository_read(&self, full_name: &str) -> Result<u16, GitHubError> {
        let url = self.repository_notifications_url(full_name);
        let response = self.send(HttpMethod::Put, url, b"{}".to_vec()).await?;
        Ok(response.status)
    }

    fn is_api_url(&self, url: &str) -> bool {
        url.strip_prefix(&self.api_base)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}
