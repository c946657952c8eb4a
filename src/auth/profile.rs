//! Current-user profile lookup used by role-gated guards.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;

use super::error::AuthError;
use super::http::{bearer, default_client, send_bounded};
use super::store::CredentialStore;
use super::token::UserProfile;
use crate::config::KeywardConfig;
use crate::error::KeywardError;

/// Source of the signed-in user's profile.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(&self) -> Result<UserProfile, KeywardError>;
}

/// Reads the profile from the probe endpoint using the stored access token.
pub struct HttpProfileFetcher {
    client: reqwest::Client,
    store: Arc<dyn CredentialStore>,
    url: String,
    timeout: Duration,
}

impl HttpProfileFetcher {
    pub fn new(store: Arc<dyn CredentialStore>, config: &KeywardConfig) -> Self {
        Self {
            client: default_client(),
            store,
            url: config.endpoints().probe,
            timeout: config.request_timeout,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl ProfileFetcher for HttpProfileFetcher {
    async fn fetch_profile(&self) -> Result<UserProfile, KeywardError> {
        let token = self.store.access_token()?.ok_or(AuthError::NotLoggedIn)?;
        let request = self.client.get(&self.url).header(AUTHORIZATION, bearer(&token));
        let exchange = send_bounded(request, self.timeout).await?;
        if !exchange.is_success() {
            let reason = exchange.status.canonical_reason().unwrap_or("unknown status");
            return Err(KeywardError::api(
                exchange.status.as_u16(),
                format!("profile request failed: {reason}"),
            ));
        }
        exchange.json()
    }
}
