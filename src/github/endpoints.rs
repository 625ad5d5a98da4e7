// GitHub API endpoint functions.
// Defines the search/fetch seams used by the controllers and implements them for GitHubClient.

use std::future::Future;

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

use super::client::GitHubClient;
use super::types::{SearchResponse, UserDetail};

/// Request executor for user search and user detail lookups.
///
/// Implementations return classified failures as data and never panic.
pub trait SearchApi: Send + Sync + 'static {
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<SearchResponse, ApiError>> + Send;

    fn get_detail(&self, login: &str)
    -> impl Future<Output = Result<UserDetail, ApiError>> + Send;
}

/// Raw payload download used by the image cache.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;
}

/// Read the whole body and decode it, separating bad JSON from JSON of the wrong shape.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| ApiError::from_transport(&e))?;
    serde_json::from_slice(&body).map_err(|e| ApiError::from_json(&e))
}

impl SearchApi for GitHubClient {
    async fn search(&self, query: &str) -> Result<SearchResponse, ApiError> {
        let mut url = self.endpoint(&["search", "users"])?;
        url.query_pairs_mut().append_pair("q", query);
        tracing::info!(query, "searching users");
        let response = self.get(url).await?;
        decode(response).await
    }

    async fn get_detail(&self, login: &str) -> Result<UserDetail, ApiError> {
        let url = self.endpoint(&["users", login])?;
        tracing::info!(login, "fetching user detail");
        let response = self.get(url).await?;
        decode(response).await
    }
}

impl Fetcher for GitHubClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(url).await
    }
}
