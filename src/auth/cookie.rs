//! Minimal document-cookie model for the refresh-token slot.
//!
//! Cookies are written with their attributes (`path`, `secure`,
//! `samesite`) and read back through the flattened `name=value; ...`
//! header, the same shape a browser exposes to scripts.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// A single cookie with the attributes this crate emits.
///
/// No expiry attribute exists: cookies are session-scoped unless the host
/// clears them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            secure: false,
            same_site: None,
        }
    }

    /// Site-wide, secure, strict same-site cookie.
    pub fn site_wide(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, value)
            .with_path("/")
            .with_secure(true)
            .with_same_site(SameSite::Strict)
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; path={path}")?;
        }
        if self.secure {
            f.write_str("; secure")?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; samesite={same_site}")?;
        }
        Ok(())
    }
}

/// Ordered set of cookies keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `cookie`, replacing any cookie with the same name.
    pub fn set(&mut self, cookie: Cookie) {
        match self.cookies.iter_mut().find(|c| c.name == cookie.name) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// The `name=value; name2=value2` header scripts see.
    pub fn header(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn get(&self, name: &str) -> Option<String> {
        get_cookie(&self.header(), name)
    }

    /// Rebuild a jar from a flattened header. Attributes are not recoverable.
    pub fn from_header(header: &str) -> Self {
        let mut jar = Self::new();
        for part in header.split(';') {
            if let Some((name, value)) = part.trim().split_once('=') {
                if !name.trim().is_empty() {
                    jar.set(Cookie::new(name.trim(), value.trim()));
                }
            }
        }
        jar
    }
}

/// Look up `name` in a cookie header.
///
/// The header is split on `"; <name>="`; anything other than exactly two
/// segments (no match, or the name appearing twice) yields `None`.
pub fn get_cookie(header: &str, name: &str) -> Option<String> {
    let full = format!("; {header}");
    let needle = format!("; {name}=");
    let segments: Vec<&str> = full.split(needle.as_str()).collect();
    if segments.len() != 2 {
        return None;
    }
    segments[1].split(';').next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_wide_cookie_renders_attributes() {
        let cookie = Cookie::site_wide("refreshToken", "r-1");
        assert_eq!(
            cookie.to_string(),
            "refreshToken=r-1; path=/; secure; samesite=strict"
        );
    }

    #[test]
    fn jar_header_flattens_name_value_pairs() {
        let mut jar = CookieJar::new();
        jar.set(Cookie::site_wide("theme", "dark"));
        jar.set(Cookie::site_wide("refreshToken", "r-1"));
        jar.set(Cookie::site_wide("theme", "light"));
        assert_eq!(jar.header(), "theme=light; refreshToken=r-1");
        assert_eq!(jar.get("refreshToken").as_deref(), Some("r-1"));
    }

    #[test]
    fn get_cookie_finds_first_and_later_entries() {
        assert_eq!(get_cookie("refreshToken=abc", "refreshToken"), Some("abc".to_string()));
        assert_eq!(
            get_cookie("a=1; refreshToken=abc; b=2", "refreshToken"),
            Some("abc".to_string())
        );
    }

    #[test]
    fn get_cookie_requires_exact_name() {
        assert_eq!(get_cookie("xrefreshToken=abc", "refreshToken"), None);
        assert_eq!(get_cookie("a=1", "refreshToken"), None);
        assert_eq!(get_cookie("", "refreshToken"), None);
    }

    #[test]
    fn get_cookie_rejects_duplicated_name() {
        assert_eq!(
            get_cookie("refreshToken=a; refreshToken=b", "refreshToken"),
            None
        );
    }

    #[test]
    fn same_site_parses_lowercase() {
        assert_eq!("strict".parse::<SameSite>().unwrap(), SameSite::Strict);
        assert_eq!(SameSite::Lax.to_string(), "lax");
    }

    #[test]
    fn from_header_round_trips_values() {
        let jar = CookieJar::from_header("a=1; refreshToken=r-2");
        assert_eq!(jar.get("a").as_deref(), Some("1"));
        assert_eq!(jar.header(), "a=1; refreshToken=r-2");
    }
}
