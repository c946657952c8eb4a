//! Remote validity check with silent, bounded, single-flight refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::AuthError;
use super::http::{bearer, default_client, send_bounded};
use super::store::CredentialStore;
use super::token::{Credentials, RefreshResponse};
use crate::config::KeywardConfig;

/// Outcome of one [`TokenAuthenticator::check`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCheck {
    /// The stored access token was accepted as-is.
    Valid,
    /// The stored access token was rejected, refreshed, and the new one accepted.
    RefreshedAndValid,
    Invalid(InvalidReason),
}

impl AuthCheck {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Valid | Self::RefreshedAndValid)
    }
}

/// Why a check ended unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// Nothing stored; no request was made.
    NoAccessToken,
    /// Probe said 401 but there is no refresh token to exchange.
    MissingRefreshToken,
    /// Refresh endpoint refused the refresh token itself (401/403).
    RefreshRejected { status: u16 },
    /// Refresh endpoint failed for another reason; the refresh token may still be good.
    RefreshFailed { status: u16 },
    /// Probe answered something other than 200 or 401.
    ProbeStatus(u16),
    /// Still rejected after the refresh budget was spent.
    RefreshLimitReached,
    /// Network failure, timeout or unreadable body.
    Transport(String),
    /// Credential store could not be read or written.
    Storage(String),
}

/// Decides whether the stored session is currently accepted by the backend.
///
/// Each call probes the backend; nothing is cached between calls. A 401
/// triggers at most `max_refresh_attempts` refresh exchanges, and concurrent
/// callers that hit a 401 for the same token share one exchange.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use keyward::auth::{MemoryCredentialStore, TokenAuthenticator};
/// use keyward::config::KeywardConfig;
///
/// # async fn example() {
/// let store = Arc::new(MemoryCredentialStore::with_credentials("access", "refresh"));
/// let auth = TokenAuthenticator::new(store, &KeywardConfig::default());
/// if auth.check_authenticated().await {
///     println!("session is live");
/// }
/// # }
/// ```
pub struct TokenAuthenticator {
    client: reqwest::Client,
    store: Arc<dyn CredentialStore>,
    probe_url: String,
    refresh_url: String,
    login_url: String,
    timeout: Duration,
    max_refresh_attempts: u32,
    // Last failed exchange, keyed by the access token it tried to replace.
    refresh_gate: Mutex<Option<(String, InvalidReason)>>,
    // Bumped after every refresh exchange.
    refresh_epoch: AtomicU64,
}

impl TokenAuthenticator {
    pub fn new(store: Arc<dyn CredentialStore>, config: &KeywardConfig) -> Self {
        let endpoints = config.endpoints();
        Self {
            client: default_client(),
            store,
            probe_url: endpoints.probe,
            refresh_url: endpoints.refresh,
            login_url: endpoints.login,
            timeout: config.request_timeout,
            max_refresh_attempts: config.max_refresh_attempts,
            refresh_gate: Mutex::new(None),
            refresh_epoch: AtomicU64::new(0),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = url.into();
        self
    }

    pub fn with_refresh_url(mut self, url: impl Into<String>) -> Self {
        self.refresh_url = url.into();
        self
    }

    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `true` when the backend accepts the stored (or freshly refreshed) token.
    pub async fn check_authenticated(&self) -> bool {
        self.check().await.is_authenticated()
    }

    /// Probe the stored access token, refreshing it on 401 within the budget.
    pub async fn check(&self) -> AuthCheck {
        let mut refreshes = 0;
        let mut refreshed = false;

        loop {
            let access_token = match self.store.access_token() {
                Ok(Some(token)) => token,
                Ok(None) => return AuthCheck::Invalid(InvalidReason::NoAccessToken),
                Err(err) => return AuthCheck::Invalid(InvalidReason::Storage(err.to_string())),
            };

            match self.probe(&access_token).await {
                Ok(StatusCode::OK) if refreshed => return AuthCheck::RefreshedAndValid,
                Ok(StatusCode::OK) => return AuthCheck::Valid,
                Ok(StatusCode::UNAUTHORIZED) => {
                    debug!("Access token rejected by probe");
                }
                Ok(status) => {
                    debug!(status = status.as_u16(), "Probe returned unexpected status");
                    return AuthCheck::Invalid(InvalidReason::ProbeStatus(status.as_u16()));
                }
                Err(err) => {
                    warn!(error = %err, "Probe request failed");
                    return AuthCheck::Invalid(InvalidReason::Transport(err.to_string()));
                }
            }

            if refreshes >= self.max_refresh_attempts {
                warn!(
                    attempts = refreshes,
                    "Access token still rejected after refresh budget"
                );
                return AuthCheck::Invalid(InvalidReason::RefreshLimitReached);
            }
            refreshes += 1;

            if let Err(reason) = self.refresh_after_rejection(&access_token).await {
                return AuthCheck::Invalid(reason);
            }
            refreshed = true;
        }
    }

    /// Exchange username/password for a fresh credential pair and store it.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credentials, AuthError> {
        let request = self
            .client
            .post(&self.login_url)
            .form(&[("username", username), ("password", password)]);
        let exchange = send_bounded(request, self.timeout).await?;

        match exchange.status {
            status if status.is_success() => {
                let credentials: Credentials = exchange.json()?;
                self.store.set_refresh_token(&credentials.refresh_token)?;
                self.store.set_access_token(&credentials.access_token)?;
                debug!("Login succeeded; credentials stored");
                Ok(credentials)
            }
            StatusCode::UNAUTHORIZED => Err(AuthError::InvalidCredentials),
            status => Err(AuthError::Api {
                status: status.as_u16(),
            }),
        }
    }

    async fn probe(&self, access_token: &str) -> Result<StatusCode, crate::error::KeywardError> {
        let request = self
            .client
            .get(&self.probe_url)
            .header(AUTHORIZATION, bearer(access_token));
        Ok(send_bounded(request, self.timeout).await?.status)
    }

    /// Refresh once on behalf of every caller that saw `rejected` fail.
    ///
    /// Holding the gate serializes refreshes. A caller that finds the stored
    /// token already replaced skips the exchange and re-probes instead. A
    /// caller that queued behind a failed exchange for the same token gets
    /// that failure back without posting again.
    async fn refresh_after_rejection(&self, rejected: &str) -> Result<(), InvalidReason> {
        let seen_epoch = self.refresh_epoch.load(Ordering::SeqCst);
        let mut last_failure = self.refresh_gate.lock().await;

        match self.store.access_token() {
            Ok(Some(current)) if current != rejected => {
                debug!("Access token already refreshed by a concurrent check");
                return Ok(());
            }
            Ok(Some(_)) => {}
            Ok(None) => return Err(InvalidReason::NoAccessToken),
            Err(err) => return Err(InvalidReason::Storage(err.to_string())),
        }

        if self.refresh_epoch.load(Ordering::SeqCst) != seen_epoch {
            if let Some((token, reason)) = last_failure.as_ref() {
                if token == rejected {
                    debug!("Concurrent refresh for this token failed; not retrying");
                    return Err(reason.clone());
                }
            }
        }

        let outcome = self.refresh_access_token().await;
        self.refresh_epoch.fetch_add(1, Ordering::SeqCst);
        *last_failure = outcome
            .as_ref()
            .err()
            .map(|reason| (rejected.to_string(), reason.clone()));
        outcome
    }

    async fn refresh_access_token(&self) -> Result<(), InvalidReason> {
        let refresh_token = match self.store.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("Access token expired and no refresh token is stored");
                return Err(InvalidReason::MissingRefreshToken);
            }
            Err(err) => return Err(InvalidReason::Storage(err.to_string())),
        };

        let access_token = self.request_refresh(&refresh_token).await.map_err(|err| {
            warn!(error = %err, "Failed to refresh access token");
            match err {
                AuthError::RefreshRejected { status } => InvalidReason::RefreshRejected { status },
                AuthError::Api { status } => InvalidReason::RefreshFailed { status },
                other => InvalidReason::Transport(other.to_string()),
            }
        })?;

        self.store
            .set_access_token(&access_token)
            .map_err(|err| InvalidReason::Storage(err.to_string()))?;
        debug!("Access token refreshed");
        Ok(())
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let request = self
            .client
            .post(&self.refresh_url)
            .form(&[("refresh_token", refresh_token)]);
        let exchange = send_bounded(request, self.timeout).await?;

        match exchange.status {
            status if status.is_success() => {
                let payload: RefreshResponse = exchange
                    .json()
                    .map_err(|err| AuthError::InvalidResponse(err.to_string()))?;
                Ok(payload.access_token)
            }
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(AuthError::RefreshRejected {
                    status: status.as_u16(),
                })
            }
            status => Err(AuthError::Api {
                status: status.as_u16(),
            }),
        }
    }
}
