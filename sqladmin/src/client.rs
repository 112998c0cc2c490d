//! Admin API client core: URL building, authorization and the three request
//! shapes every resource group uses (fetch, paginated list, mutation).

use std::sync::Arc;

use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use common::credentials::CredentialProvider;
use common::errors::{AppError, AppResult};
use common::models::Operation;

use crate::databases::Databases;
use crate::instances::Instances;
use crate::users::Users;

/// Entry point to the Cloud SQL Admin API.
///
/// Cheap to clone. Holds no per-call state: every operation returns its own
/// result.
#[derive(Clone)]
pub struct SqlAdmin {
    endpoint: Url,
    http_client: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

/// One page of a list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl SqlAdmin {
    /// Creates a client for the API rooted at `endpoint`
    /// (e.g. `https://sqladmin.googleapis.com/sql/v1beta4`).
    pub fn new(
        endpoint: &str,
        http_client: reqwest::Client,
        credentials: Arc<dyn CredentialProvider>,
    ) -> AppResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| AppError::Config(format!("invalid Admin API endpoint {endpoint}: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Admin API endpoint {endpoint} cannot carry a path"
            )));
        }
        Ok(Self {
            endpoint,
            http_client,
            credentials,
        })
    }

    pub fn databases(&self) -> Databases<'_> {
        Databases::new(self)
    }

    pub fn instances(&self) -> Instances<'_> {
        Instances::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    /// Endpoint URL with `segments` appended, each percent-encoded.
    pub(crate) fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn authorized(&self, method: Method, url: Url) -> AppResult<reqwest::RequestBuilder> {
        let token = self.credentials.access_token().await?;
        Ok(self.http_client.request(method, url).bearer_auth(token))
    }

    /// GETs one resource. A 404 is `Ok(None)`.
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, url: Url) -> AppResult<Option<T>> {
        let response = self.authorized(Method::GET, url).await?.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Admin API returned {status}: {body}"
            )));
        }
        let resource = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("undecodable Admin API response: {e}")))?;
        Ok(Some(resource))
    }

    /// Like [`fetch`](Self::fetch) but folds every failure into `None`.
    pub(crate) async fn get_or_none<T: DeserializeOwned>(&self, url: Url, action: &str) -> Option<T> {
        match self.fetch(url).await {
            Ok(resource) => resource,
            Err(err) => {
                tracing::warn!(action, error = %err, "Admin API read failed");
                None
            }
        }
    }

    /// GETs every page of a list, following `nextPageToken`.
    pub(crate) async fn list_all<T: DeserializeOwned>(&self, url: Url) -> AppResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut page_url = url.clone();
            if let Some(token) = &page_token {
                page_url.query_pairs_mut().append_pair("pageToken", token);
            }
            let page: ListPage<T> = self
                .fetch(page_url)
                .await?
                .ok_or_else(|| AppError::NotFound(url.path().to_string()))?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) if page_token.as_deref() == Some(token.as_str()) => {
                    tracing::warn!(url = %url, page_token = %token, "Admin API repeated the page token, stopping");
                    break;
                }
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(items)
    }

    /// Sends a mutating request and reduces the outcome to a success flag.
    ///
    /// Transport errors, non-2xx statuses and operations carrying an `error`
    /// field are all `false`; nothing is propagated.
    pub(crate) async fn mutate(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        action: &str,
    ) -> bool {
        match self.try_mutate(method, url, body).await {
            Ok(op) if op.has_error() => {
                tracing::warn!(action, operation = ?op.name, error = ?op.error, "Admin API operation reported an error");
                false
            }
            Ok(op) => {
                tracing::info!(action, operation = ?op.name, status = ?op.status, "Admin API operation accepted");
                true
            }
            Err(err) => {
                tracing::warn!(action, error = %err, "Admin API call failed");
                false
            }
        }
    }

    async fn try_mutate(&self, method: Method, url: Url, body: Option<&Value>) -> AppResult<Operation> {
        let mut request = self.authorized(method, url).await?;
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AppError::ExternalService(format!(
                "Admin API returned {status}: {text}"
            )));
        }
        if text.trim().is_empty() {
            return Ok(Operation::default());
        }
        serde_json::from_str(&text)
            .map_err(|e| AppError::ExternalService(format!("undecodable operation: {e}")))
    }
}
