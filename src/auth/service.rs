use std::sync::Arc;

use super::authenticator::{AuthCheck, TokenAuthenticator};
use super::error::AuthError;
use super::profile::ProfileFetcher;
use super::store::CredentialStore;
use super::token::{Credentials, UserProfile};
use crate::error::KeywardError;

/// Where the host should go after a session-level action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Full page load of `path`: every piece of in-memory state is dropped.
    FullReload { path: String },
}

/// Session status as reported by [`AuthService::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No access token is stored.
    LoggedOut,
    /// A token is stored; this is what the backend made of it.
    Checked(AuthCheck),
}

/// Session facade: login, logout, status and profile in one place.
///
/// All I/O decisions (printing, prompting, navigation) belong to the caller.
/// `AuthService` only returns typed results and errors.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use keyward::auth::{AuthService, HttpProfileFetcher, MemoryCredentialStore, TokenAuthenticator};
/// use keyward::config::KeywardConfig;
///
/// let config = KeywardConfig::from_env();
/// let store = Arc::new(MemoryCredentialStore::new());
/// let auth = Arc::new(TokenAuthenticator::new(store.clone(), &config));
/// let profile = Arc::new(HttpProfileFetcher::new(store, &config));
/// let svc = AuthService::new(auth, profile);
/// ```
pub struct AuthService {
    authenticator: Arc<TokenAuthenticator>,
    profile: Arc<dyn ProfileFetcher>,
}

impl AuthService {
    pub fn new(authenticator: Arc<TokenAuthenticator>, profile: Arc<dyn ProfileFetcher>) -> Self {
        Self {
            authenticator,
            profile,
        }
    }

    pub fn authenticator(&self) -> &Arc<TokenAuthenticator> {
        &self.authenticator
    }

    fn store(&self) -> &Arc<dyn CredentialStore> {
        self.authenticator.store()
    }

    /// Log in and store both credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credentials, AuthError> {
        self.authenticator.login(username, password).await
    }

    /// Drop both credentials and ask the host for a hard reload of `/`.
    pub fn logout(&self) -> Result<Navigation, AuthError> {
        self.store().clear_credentials()?;
        tracing::debug!("Credentials cleared");
        Ok(Navigation::FullReload {
            path: "/".to_string(),
        })
    }

    /// Check the stored session against the backend.
    pub async fn status(&self) -> Result<SessionStatus, AuthError> {
        if self.store().access_token()?.is_none() {
            return Ok(SessionStatus::LoggedOut);
        }
        Ok(SessionStatus::Checked(self.authenticator.check().await))
    }

    pub async fn current_profile(&self) -> Result<UserProfile, KeywardError> {
        self.profile.fetch_profile().await
    }
}
