//! Tests for environment-driven configuration.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use keyward::config::KeywardConfig;
use keyward::guard::{GuardMode, GuardOptions};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 8] = [
    "KEYWARD_BASE_URL",
    "KEYWARD_TIMEOUT_MS",
    "KEYWARD_MAX_REFRESH_ATTEMPTS",
    "KEYWARD_LOGIN_ROUTE",
    "KEYWARD_LANDING_ROUTE",
    "KEYWARD_RESTRICTED_ROLE",
    "KEYWARD_PROFILE_ATTEMPTS",
    "KEYWARD_HOME",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        for key in keys {
            std::env::remove_var(key);
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn from_env_reads_keyward_variables() {
    let _env_lock = env_lock_guard();
    let _env_guard = EnvGuard::capture(&CONFIG_ENV_VARS);

    std::env::set_var("KEYWARD_BASE_URL", "http://backend.test:9000");
    std::env::set_var("KEYWARD_MAX_REFRESH_ATTEMPTS", "3");
    std::env::set_var("KEYWARD_LOGIN_ROUTE", "/login");
    std::env::set_var("KEYWARD_HOME", "/tmp/keyward-env");

    let config = KeywardConfig::from_env();

    assert_eq!(
        config.endpoints().refresh,
        "http://backend.test:9000/login/token/refresh"
    );
    assert_eq!(config.max_refresh_attempts, 3);
    assert_eq!(config.login_route, "/login");
    assert_eq!(config.credentials_dir, PathBuf::from("/tmp/keyward-env"));
}

#[test]
fn from_env_keeps_defaults_for_bad_numbers() {
    let _env_lock = env_lock_guard();
    let _env_guard = EnvGuard::capture(&CONFIG_ENV_VARS);

    std::env::set_var("KEYWARD_TIMEOUT_MS", "soon");
    std::env::set_var("KEYWARD_PROFILE_ATTEMPTS", "-1");

    let config = KeywardConfig::from_env();

    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(config.profile_attempts, 2);
}

#[test]
fn code_overrides_win_over_env() {
    let _env_lock = env_lock_guard();
    let _env_guard = EnvGuard::capture(&CONFIG_ENV_VARS);

    std::env::set_var("KEYWARD_RESTRICTED_ROLE", "intern");

    let config = KeywardConfig::from_env().with_restricted_role("contractor");
    assert_eq!(config.restricted_role, "contractor");
}

#[test]
fn guard_options_follow_config() {
    let config = KeywardConfig::default()
        .with_request_timeout(Duration::from_secs(1))
        .with_max_refresh_attempts(2)
        .with_landing_route("/dashboard");

    let options = GuardOptions::role_gated(&config);

    assert_eq!(
        options.mode,
        GuardMode::RoleGated {
            restricted_role: "developer".to_string()
        }
    );
    assert_eq!(options.landing_route, "/dashboard");
    assert_eq!(options.check_timeout, Duration::from_secs(6));
    assert_eq!(options.profile_timeout, Duration::from_secs(1));
}

#[test]
fn max_refresh_budget_from_env_keeps_guards_usable() {
    let max = u32::MAX.to_string();
    let config = KeywardConfig::from_lookup(|key| {
        (key == "KEYWARD_MAX_REFRESH_ATTEMPTS").then(|| max.clone())
    });
    assert_eq!(config.max_refresh_attempts, u32::MAX);

    let options = GuardOptions::token_only(&config);
    assert!(options.check_timeout >= config.request_timeout);
}
