//! Helpers shared by the resource-group tests.

use std::sync::Arc;

use common::credentials::StaticCredentials;
use wiremock::{Match, MockServer, Request};

use crate::SqlAdmin;

pub const ACCESS_TOKEN: &str = "test-access-token";

/// Nothing listens on port 1, so connections are refused.
pub const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:1/sql/v1beta4";

pub fn admin_at(endpoint: &str) -> SqlAdmin {
    SqlAdmin::new(
        endpoint,
        reqwest::Client::new(),
        Arc::new(StaticCredentials::new(Some(ACCESS_TOKEN.to_string()), None)),
    )
    .unwrap()
}

pub fn admin_for(server: &MockServer) -> SqlAdmin {
    admin_at(&format!("{}/sql/v1beta4", server.uri()))
}

/// Matches the first page of a list call.
pub struct NoPageToken;

impl Match for NoPageToken {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == "pageToken")
    }
}
