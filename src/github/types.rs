// GitHub API response types.
// Defines structs for deserializing user search and user detail responses.

use serde::{Deserialize, Serialize};

/// One user row from a search. Two items are the same user when their logins match.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub login: String,
    pub avatar_url: String,
}

impl SearchResultItem {
    pub fn new(login: impl Into<String>, avatar_url: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            avatar_url: avatar_url.into(),
        }
    }
}

impl PartialEq for SearchResultItem {
    fn eq(&self, other: &Self) -> bool {
        self.login == other.login
    }
}

/// Response wrapper for `/search/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<SearchResultItem>,
}

/// Profile returned by `/users/{login}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetail {
    pub login: String,
    pub avatar_url: String,
    #[serde(rename = "html_url")]
    pub profile_url: String,
    #[serde(rename = "name")]
    pub display_name: Option<String>,
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}
