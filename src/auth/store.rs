use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cookie::{Cookie, CookieJar};
use super::error::AuthError;

/// Key of the access-token slot in volatile storage.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Name of the refresh-token cookie.
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// The two client-side credential slots.
///
/// The access token lives in a volatile key-value slot; the refresh token
/// lives in a site-wide, secure, strict same-site cookie. Writing one slot
/// never touches the other. Implementations are injected as
/// `Arc<dyn CredentialStore>` so callers and tests can swap them.
pub trait CredentialStore: Send + Sync {
    /// Overwrite the access token. No validation is performed.
    fn set_access_token(&self, token: &str) -> Result<(), AuthError>;
    fn access_token(&self) -> Result<Option<String>, AuthError>;
    /// Write the refresh cookie with `path=/; secure; samesite=strict`.
    fn set_refresh_token(&self, token: &str) -> Result<(), AuthError>;
    /// Read the refresh cookie. Missing, malformed or emptied cookies are `None`.
    fn refresh_token(&self) -> Result<Option<String>, AuthError>;
    /// Empty the refresh cookie and drop the access token.
    fn clear_credentials(&self) -> Result<(), AuthError>;
}

/// Both slots as plain data; shared by the store implementations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSlots {
    #[serde(default)]
    pub storage: BTreeMap<String, String>,
    #[serde(default)]
    pub cookies: CookieJar,
}

impl CredentialSlots {
    fn set_access_token(&mut self, token: &str) {
        self.storage
            .insert(ACCESS_TOKEN_KEY.to_string(), token.to_string());
    }

    fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY).cloned()
    }

    fn set_refresh_token(&mut self, token: &str) {
        self.cookies
            .set(Cookie::site_wide(REFRESH_COOKIE_NAME, token));
    }

    fn refresh_token(&self) -> Option<String> {
        self.cookies
            .get(REFRESH_COOKIE_NAME)
            .filter(|value| !value.is_empty())
    }

    fn clear(&mut self) {
        self.cookies
            .set(Cookie::new(REFRESH_COOKIE_NAME, "").with_path("/"));
        self.storage.remove(ACCESS_TOKEN_KEY);
    }
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slots: RwLock<CredentialSlots>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with both credentials, as a login would leave it.
    pub fn with_credentials(access_token: &str, refresh_token: &str) -> Self {
        let mut slots = CredentialSlots::default();
        slots.set_access_token(access_token);
        slots.set_refresh_token(refresh_token);
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// The flattened cookie header, as a script would read it.
    pub fn cookie_header(&self) -> String {
        self.slots
            .read()
            .map(|slots| slots.cookies.header())
            .unwrap_or_default()
    }

    /// Raw `name=value; attrs` string of the refresh cookie, if set.
    pub fn refresh_cookie(&self) -> Option<String> {
        let slots = self.slots.read().ok()?;
        slots
            .cookies
            .cookie(REFRESH_COOKIE_NAME)
            .map(ToString::to_string)
    }

    fn read<T>(&self, f: impl FnOnce(&CredentialSlots) -> T) -> Result<T, AuthError> {
        let slots = self
            .slots
            .read()
            .map_err(|_| AuthError::Io("credential store lock poisoned".to_string()))?;
        Ok(f(&slots))
    }

    fn write(&self, f: impl FnOnce(&mut CredentialSlots)) -> Result<(), AuthError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| AuthError::Io("credential store lock poisoned".to_string()))?;
        f(&mut slots);
        Ok(())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn set_access_token(&self, token: &str) -> Result<(), AuthError> {
        self.write(|slots| slots.set_access_token(token))
    }

    fn access_token(&self) -> Result<Option<String>, AuthError> {
        self.read(CredentialSlots::access_token)
    }

    fn set_refresh_token(&self, token: &str) -> Result<(), AuthError> {
        self.write(|slots| slots.set_refresh_token(token))
    }

    fn refresh_token(&self) -> Result<Option<String>, AuthError> {
        self.read(CredentialSlots::refresh_token)
    }

    fn clear_credentials(&self) -> Result<(), AuthError> {
        self.write(CredentialSlots::clear)
    }
}

/// File-backed credential store so a session survives process restarts.
///
/// # Example
/// ```no_run
/// use keyward::auth::{CredentialStore, FileCredentialStore};
///
/// let store = FileCredentialStore::new(std::path::PathBuf::from("/tmp/keyward"));
/// store.set_access_token("access")?;
/// store.set_refresh_token("refresh")?;
/// # Ok::<(), keyward::auth::AuthError>(())
/// ```
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            path: base_dir.join("credentials.toml"),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CredentialSlots, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CredentialSlots::default())
            }
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: CredentialFile = toml::from_str(&raw)?;
        Ok(file.slots)
    }

    fn save(&self, slots: CredentialSlots) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = CredentialFile {
            version: 1,
            saved_at: Utc::now(),
            slots,
        };
        fs::write(&self.path, toml::to_string(&file)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut CredentialSlots)) -> Result<(), AuthError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| AuthError::Io("credential file lock poisoned".to_string()))?;
        let mut slots = self.load()?;
        f(&mut slots);
        self.save(slots)
    }
}

impl CredentialStore for FileCredentialStore {
    fn set_access_token(&self, token: &str) -> Result<(), AuthError> {
        self.update(|slots| slots.set_access_token(token))
    }

    fn access_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.load()?.access_token())
    }

    fn set_refresh_token(&self, token: &str) -> Result<(), AuthError> {
        self.update(|slots| slots.set_refresh_token(token))
    }

    fn refresh_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.load()?.refresh_token())
    }

    fn clear_credentials(&self) -> Result<(), AuthError> {
        self.update(CredentialSlots::clear)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    version: u32,
    saved_at: DateTime<Utc>,
    slots: CredentialSlots,
}
