//! Google credential providers.
//!
//! A provider is resolved once at startup and shared through an
//! `Arc<dyn CredentialProvider>`. Token acquisition, caching and refresh are
//! delegated to `google-cloud-auth`; this module only adapts it to the
//! service's error type.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use google_cloud_auth::credentials::idtoken::{self, IDTokenCredentials};
use google_cloud_auth::credentials::{self as gauth, AccessTokenCredentials};

use crate::config::GoogleConfig;
use crate::errors::{AppError, AppResult};

/// OAuth scope used for Admin API calls.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Source of bearer tokens for outbound Google calls.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// OAuth2 access token for Admin API calls.
    async fn access_token(&self) -> AppResult<String>;

    /// OIDC identity token whose `aud` claim is `audience`.
    async fn identity_token(&self, audience: &str) -> AppResult<String>;

    /// Short provider name for logs.
    fn kind(&self) -> &'static str;
}

/// Picks a provider from configuration.
///
/// Static tokens win; otherwise Application Default Credentials are used.
pub fn resolve(google: &GoogleConfig) -> AppResult<Arc<dyn CredentialProvider>> {
    let provider: Arc<dyn CredentialProvider> = if google.static_access_token.is_some()
        || google.static_identity_token.is_some()
    {
        Arc::new(StaticCredentials::new(
            google.static_access_token.clone(),
            google.static_identity_token.clone(),
        ))
    } else {
        Arc::new(GoogleCredentials::application_default()?)
    };
    tracing::info!(provider = provider.kind(), "credential provider resolved");
    Ok(provider)
}

/// Fixed tokens, for local runs against a proxy and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    access_token: Option<String>,
    identity_token: Option<String>,
}

impl StaticCredentials {
    pub fn new(access_token: Option<String>, identity_token: Option<String>) -> Self {
        Self {
            access_token,
            identity_token,
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn access_token(&self) -> AppResult<String> {
        self.access_token
            .clone()
            .ok_or_else(|| AppError::Credential("no static access token configured".to_string()))
    }

    async fn identity_token(&self, _audience: &str) -> AppResult<String> {
        self.identity_token
            .clone()
            .ok_or_else(|| AppError::Credential("no static identity token configured".to_string()))
    }

    fn kind(&self) -> &'static str {
        "static"
    }
}

type IdTokenBuilder = Box<dyn Fn(&str) -> AppResult<IDTokenCredentials> + Send + Sync>;

/// Credentials backed by `google-cloud-auth`.
///
/// Access tokens come from one cached credential. Identity-token credentials
/// are built on first use per audience and kept, so each audience keeps its
/// own token cache.
pub struct GoogleCredentials {
    access: AccessTokenCredentials,
    id_token_builder: IdTokenBuilder,
    id_tokens: Mutex<HashMap<String, IDTokenCredentials>>,
}

impl GoogleCredentials {
    /// Application Default Credentials: `GOOGLE_APPLICATION_CREDENTIALS`, the
    /// gcloud well-known file, then the metadata server.
    pub fn application_default() -> AppResult<Self> {
        let access = gauth::Builder::default()
            .with_scopes([CLOUD_PLATFORM_SCOPE])
            .build_access_token_credentials()
            .map_err(|e| AppError::Config(format!("application default credentials: {e}")))?;
        Ok(Self::from_parts(access, |audience| {
            idtoken::Builder::new(audience)
                .build()
                .map_err(|e| AppError::Config(format!("identity token credentials: {e}")))
        }))
    }

    pub(crate) fn from_parts(
        access: AccessTokenCredentials,
        id_token_builder: impl Fn(&str) -> AppResult<IDTokenCredentials> + Send + Sync + 'static,
    ) -> Self {
        Self {
            access,
            id_token_builder: Box::new(id_token_builder),
            id_tokens: Mutex::new(HashMap::new()),
        }
    }

    fn id_token_credentials(&self, audience: &str) -> AppResult<IDTokenCredentials> {
        let mut cache = self
            .id_tokens
            .lock()
            .map_err(|_| AppError::Internal("identity token cache poisoned".to_string()))?;
        if let Some(creds) = cache.get(audience) {
            return Ok(creds.clone());
        }
        let creds = (self.id_token_builder)(audience)?;
        cache.insert(audience.to_string(), creds.clone());
        Ok(creds)
    }
}

impl fmt::Debug for GoogleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleCredentials").finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialProvider for GoogleCredentials {
    async fn access_token(&self) -> AppResult<String> {
        self.access
            .access_token()
            .await
            .map(|token| token.token)
            .map_err(|e| AppError::Credential(format!("access token: {e}")))
    }

    async fn identity_token(&self, audience: &str) -> AppResult<String> {
        // Cloned out so the lock is not held across the await.
        let creds = self.id_token_credentials(audience)?;
        creds
            .id_token()
            .await
            .map_err(|e| AppError::Credential(format!("identity token for {audience}: {e}")))
    }

    fn kind(&self) -> &'static str {
        "application-default"
    }
}
