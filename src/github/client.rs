// GitHub API HTTP client.
// Handles authentication, rate limiting, and status classification.

use std::sync::{Mutex, PoisonError};

use reqwest::{
    Client, Response, Url,
    header::{ACCEPT, AUTHORIZATION, HeaderValue},
};

use crate::error::{ApiError, AppError, Result};

use super::types::RateLimit;

pub const GITHUB_API_BASE: &str = "https://api.github.com/";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// GitHub API client with optional authentication and rate limit tracking.
///
/// Shared behind an `Arc` by every controller; the only mutable state is the
/// last observed rate limit.
pub struct GitHubClient {
    client: Client,
    base: Url,
    token: Option<HeaderValue>,
    rate_limit: Mutex<RateLimit>,
}

impl GitHubClient {
    /// Create a client for `base` with an optional bearer token.
    pub fn new(base: &str, token: Option<&str>) -> Result<Self> {
        let base = Url::parse(base).map_err(|_| AppError::Api(ApiError::InvalidUrl))?;

        let token = token
            .map(|t| HeaderValue::from_str(&format!("Bearer {}", t)))
            .transpose()
            .map_err(|e| AppError::Other(e.to_string()))?;

        let client = Client::builder()
            .user_agent("ghsearch-tui")
            .build()
            .map_err(AppError::Http)?;

        Ok(Self {
            client,
            base,
            token,
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    /// Create a client using the GITHUB_TOKEN environment variable if set.
    pub fn from_env(base: &str) -> Result<Self> {
        let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        Self::new(base, token.as_deref())
    }

    /// Get the last observed rate limit information.
    pub fn rate_limit(&self) -> RateLimit {
        *self.rate_limit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build an API URL from path segments, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make an authenticated GET request to the GitHub API.
    pub async fn get(&self, url: Url) -> std::result::Result<Response, ApiError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, token.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        self.update_rate_limit(&response);
        Self::check_response(response)
    }

    /// Make an unauthenticated GET for raw bytes (avatars live off the API host).
    pub async fn get_bytes(&self, url: &str) -> std::result::Result<Vec<u8>, ApiError> {
        let url = Url::parse(url).map_err(|_| ApiError::InvalidUrl)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;
        let response = Self::check_response(response)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;
        Ok(bytes.to_vec())
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&self, response: &Response) {
        let header = |name: &str| -> Option<u64> {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
        };

        let mut rate_limit = self.rate_limit.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(limit) = header("x-ratelimit-limit") {
            rate_limit.limit = limit;
        }
        if let Some(remaining) = header("x-ratelimit-remaining") {
            rate_limit.remaining = remaining;
        }
        if let Some(reset) = header("x-ratelimit-reset") {
            rate_limit.reset = reset;
        }
        if rate_limit.limit > 0 && rate_limit.remaining == 0 {
            tracing::warn!(reset = rate_limit.reset, "GitHub API rate limit exhausted");
        }
    }

    /// Check response status and classify failures.
    fn check_response(response: Response) -> std::result::Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            tracing::debug!(status = status.as_u16(), url = %response.url(), "request failed");
            Err(ApiError::from_status(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = GitHubClient::new(GITHUB_API_BASE, None).unwrap();
        let url = client.endpoint(&["users", "Mine Rala"]).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/users/Mine%20Rala");

        let url = client.endpoint(&["search", "users"]).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/search/users");
    }

    #[test]
    fn test_base_without_trailing_slash() {
        let client = GitHubClient::new("http://localhost:8080/api", None).unwrap();
        let url = client.endpoint(&["users", "x"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/users/x");
    }

    #[test]
    fn test_invalid_base() {
        assert!(GitHubClient::new("not a url", None).is_err());
    }
}
