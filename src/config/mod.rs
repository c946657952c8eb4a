//! Configuration system (layered: code > env > defaults).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const PROBE_PATH: &str = "/login/test_auth_endpoint";
pub const REFRESH_PATH: &str = "/login/token/refresh";
pub const LOGIN_PATH: &str = "/login/token";

/// Runtime configuration for the auth core.
///
/// Resolution order:
/// 1. Values set in code through the `with_*` methods
/// 2. `KEYWARD_*` environment variables (a `.env` file is loaded first)
/// 3. Built-in defaults
#[derive(Debug, Clone)]
pub struct KeywardConfig {
    pub base_url: String,
    /// Upper bound for every probe, refresh, login and profile request.
    pub request_timeout: Duration,
    /// Refresh attempts allowed per `check_authenticated` call.
    pub max_refresh_attempts: u32,
    pub login_route: String,
    pub landing_route: String,
    /// Role that is bounced off role-gated routes.
    pub restricted_role: String,
    /// Profile fetch attempts before a role-gated guard gives up.
    pub profile_attempts: u32,
    pub credentials_dir: PathBuf,
}

impl Default for KeywardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            max_refresh_attempts: 1,
            login_route: "/".to_string(),
            landing_route: "/home".to_string(),
            restricted_role: "developer".to_string(),
            profile_attempts: 2,
            credentials_dir: default_credentials_dir(),
        }
    }
}

impl KeywardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `KEYWARD_*` environment variables on top of the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("KEYWARD_BASE_URL") {
            config.base_url = url;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "KEYWARD_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var(&lookup, "KEYWARD_MAX_REFRESH_ATTEMPTS") {
            config.max_refresh_attempts = n;
        }
        if let Some(route) = lookup("KEYWARD_LOGIN_ROUTE") {
            config.login_route = route;
        }
        if let Some(route) = lookup("KEYWARD_LANDING_ROUTE") {
            config.landing_route = route;
        }
        if let Some(role) = lookup("KEYWARD_RESTRICTED_ROLE") {
            config.restricted_role = role;
        }
        if let Some(n) = parse_var(&lookup, "KEYWARD_PROFILE_ATTEMPTS") {
            config.profile_attempts = n;
        }
        if let Some(dir) = lookup("KEYWARD_HOME") {
            config.credentials_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_refresh_attempts(mut self, attempts: u32) -> Self {
        self.max_refresh_attempts = attempts;
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn with_landing_route(mut self, route: impl Into<String>) -> Self {
        self.landing_route = route.into();
        self
    }

    pub fn with_restricted_role(mut self, role: impl Into<String>) -> Self {
        self.restricted_role = role.into();
        self
    }

    pub fn with_profile_attempts(mut self, attempts: u32) -> Self {
        self.profile_attempts = attempts;
        self
    }

    pub fn with_credentials_dir(mut self, dir: PathBuf) -> Self {
        self.credentials_dir = dir;
        self
    }

    /// Endpoint URLs derived from `base_url`.
    pub fn endpoints(&self) -> Endpoints {
        let base = self.base_url.trim_end_matches('/');
        Endpoints {
            probe: format!("{base}{PROBE_PATH}"),
            refresh: format!("{base}{REFRESH_PATH}"),
            login: format!("{base}{LOGIN_PATH}"),
        }
    }
}

/// Fully-qualified backend endpoint URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub probe: String,
    pub refresh: String,
    pub login: String,
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable config value");
            None
        }
    }
}

fn default_credentials_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".keyward"))
        .unwrap_or_else(|| PathBuf::from(".keyward"))
}
