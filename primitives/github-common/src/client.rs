//! GitHub API client.
//!
//! Every call goes through one reqwest client built with the credential,
//! the API version headers and a whole-request timeout. Repository listing
//! follows the `rel="next"` links GitHub returns in the `Link` header.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;

use crate::error::{ClientError, UpdateFailure};
use crate::repository::RepositoryRecord;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: u8 = 100;

/// Operations the batch driver needs from the hosting platform.
pub trait PropertyHost {
    /// Confirms the organization exists and the credential can see it.
    fn verify_organization(&self, org: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Lists every repository in the organization.
    fn list_repositories(
        &self,
        org: &str,
    ) -> impl Future<Output = Result<Vec<RepositoryRecord>, ClientError>> + Send;

    /// Sets a single custom property on a single repository.
    fn set_property(
        &self,
        repo: &RepositoryRecord,
        name: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), UpdateFailure>> + Send;
}

/// Connection settings for [`GithubClient`].
#[derive(Clone)]
pub struct ClientConfig {
    pub token: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Points the client at a GitHub Enterprise (or test) API root.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct PropertyValuesRequest<'a> {
    properties: [PropertyValue<'a>; 1],
}

#[derive(Debug, Serialize)]
struct PropertyValue<'a> {
    property_name: &'a str,
    value: &'a str,
}

/// Extracts the `rel="next"` target from a `Link` header.
fn next_page(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params.split(';').any(|p| p.trim() == r#"rel="next""#);
        is_next.then(|| {
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    })
}

/// Client for the GitHub REST API.
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    api_url: String,
}

impl GithubClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| ClientError::Setup("token is not a valid header value".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .default_headers(headers)
            .user_agent("github-properties")
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.api_url,
        })
    }

    async fn get(&self, url: &str) -> Result<Response, ClientError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ClientError::from_status(status.as_u16()))
        }
    }
}

impl PropertyHost for GithubClient {
    async fn verify_organization(&self, org: &str) -> Result<(), ClientError> {
        self.get(&format!("{}/orgs/{org}", self.api_url)).await?;
        Ok(())
    }

    async fn list_repositories(&self, org: &str) -> Result<Vec<RepositoryRecord>, ClientError> {
        let mut url = format!("{}/orgs/{org}/repos?per_page={PER_PAGE}&type=all", self.api_url);
        let mut repos = Vec::new();

        loop {
            let response = self.get(&url).await?;
            let next = next_page(response.headers());
            let page: Vec<RepositoryRecord> = response.json().await?;
            debug!(org, page_len = page.len(), "fetched repository page");
            repos.extend(page.into_iter().map(|r| r.qualify(org)));

            match next {
                Some(next) if next != url => url = next,
                _ => break,
            }
        }

        debug!(org, count = repos.len(), "listed repositories");
        Ok(repos)
    }

    async fn set_property(
        &self,
        repo: &RepositoryRecord,
        name: &str,
        value: &str,
    ) -> Result<(), UpdateFailure> {
        let url = format!("{}/repos/{}/properties/values", self.api_url, repo.full_name);
        let body = PropertyValuesRequest {
            properties: [PropertyValue {
                property_name: name,
                value,
            }],
        };

        let response = self.http.patch(&url).json(&body).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(UpdateFailure::from_status(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn api_url_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("t").with_api_url("https://ghe.example.com/api/v3/");
        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = ClientConfig::new("ghp_secret_value");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("ghp_secret_value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let err = GithubClient::new(ClientConfig::new("bad\ntoken")).err();
        assert!(matches!(err, Some(ClientError::Setup(_))));
    }

    #[test]
    fn next_link_is_found_among_others() {
        let headers = link(
            r#"<https://api.github.com/organizations/1/repos?page=1>; rel="prev", <https://api.github.com/organizations/1/repos?page=3>; rel="next", <https://api.github.com/organizations/1/repos?page=9>; rel="last""#,
        );
        assert_eq!(
            next_page(&headers).as_deref(),
            Some("https://api.github.com/organizations/1/repos?page=3")
        );
    }

    #[test]
    fn last_page_has_no_next_link() {
        let headers = link(r#"<https://api.github.com/x?page=1>; rel="first", <https://api.github.com/x?page=4>; rel="prev""#);
        assert_eq!(next_page(&headers), None);
        assert_eq!(next_page(&HeaderMap::new()), None);
    }

    #[test]
    fn update_body_shape() {
        let body = PropertyValuesRequest {
            properties: [PropertyValue {
                property_name: "team",
                value: "backend",
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"properties": [{"property_name": "team", "value": "backend"}]})
        );
    }
}
