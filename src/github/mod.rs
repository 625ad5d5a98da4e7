// GitHub API module.
// Provides the client, request seams and types for the users API.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{GITHUB_API_BASE, GitHubClient};
pub use endpoints::{Fetcher, SearchApi};
pub use types::*;
