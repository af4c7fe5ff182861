//! Persistence mirrors for session data.
//!
//! - [`LocalStore`]: client-local key/value storage, no expiry.
//! - [`CookieJar`]: server-readable cookies with `max-age` semantics.
//!
//! Both can be backed by a JSON file so a session outlives the process.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;

/// One storage area holding a copy of the session.
pub trait SessionMirror: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Store `value` under `key`. `max_age` is honored by mirrors that expire entries.
    fn set(&self, key: &str, value: &str, max_age: Option<Duration>) -> Result<()>;

    fn get(&self, key: &str) -> Option<String>;

    /// Remove every entry, not only the session keys.
    fn clear(&self) -> Result<()>;

    fn is_empty(&self) -> bool;
}

/// Client-local key/value mirror.
#[derive(Debug, Default)]
pub struct LocalStore {
    entries: RwLock<BTreeMap<String, String>>,
    file: Option<PathBuf>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a file-backed store, loading existing entries.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries: BTreeMap<String, String> = read_json(&path)?.unwrap_or_default();
        Ok(Self {
            entries: RwLock::new(entries),
            file: Some(path),
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        match &self.file {
            Some(path) => write_json(path, entries),
            None => Ok(()),
        }
    }
}

impl SessionMirror for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn set(&self, key: &str, value: &str, _max_age: Option<Duration>) -> Result<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write();
        entries.clear();
        self.persist(&entries)
    }

    fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// A single cookie as the server-rendered side would see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub secure: bool,
}

impl Cookie {
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// `Set-Cookie` header value with the remaining lifetime as `max-age`.
    pub fn to_set_cookie(&self, now: DateTime<Utc>) -> String {
        let mut out = format!("{}={}; path={}", self.name, self.value, self.path);
        if let Some(expires_at) = self.expires_at {
            let remaining = (expires_at - now).num_seconds().max(0);
            out.push_str(&format!("; max-age={remaining}"));
        }
        if self.secure {
            out.push_str("; secure");
        }
        out.push_str("; samesite=strict");
        out
    }
}

/// Server-readable cookie mirror.
#[derive(Debug)]
pub struct CookieJar {
    cookies: RwLock<BTreeMap<String, Cookie>>,
    secure: bool,
    file: Option<PathBuf>,
}

impl CookieJar {
    pub fn new(secure: bool) -> Self {
        Self {
            cookies: RwLock::new(BTreeMap::new()),
            secure,
            file: None,
        }
    }

    /// Open a file-backed jar, dropping cookies that expired while it was closed.
    pub fn open(path: impl Into<PathBuf>, secure: bool) -> Result<Self> {
        let path = path.into();
        let now = Utc::now();
        let cookies: BTreeMap<String, Cookie> = read_json(&path)?.unwrap_or_default();
        let cookies = cookies
            .into_iter()
            .filter(|(_, cookie)| !cookie.is_expired(now))
            .collect();
        Ok(Self {
            cookies: RwLock::new(cookies),
            secure,
            file: Some(path),
        })
    }

    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        let now = Utc::now();
        self.cookies
            .read()
            .get(name)
            .filter(|cookie| !cookie.is_expired(now))
            .cloned()
    }

    /// `Cookie` request header value for server-rendered pages, if any cookie is live.
    pub fn header_value(&self) -> Option<String> {
        let now = Utc::now();
        let header = self
            .cookies
            .read()
            .values()
            .filter(|cookie| !cookie.is_expired(now))
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        (!header.is_empty()).then_some(header)
    }

    /// `Set-Cookie` lines for every live cookie.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        let now = Utc::now();
        self.cookies
            .read()
            .values()
            .filter(|cookie| !cookie.is_expired(now))
            .map(|cookie| cookie.to_set_cookie(now))
            .collect()
    }

    fn persist(&self, cookies: &BTreeMap<String, Cookie>) -> Result<()> {
        match &self.file {
            Some(path) => write_json(path, cookies),
            None => Ok(()),
        }
    }
}

impl SessionMirror for CookieJar {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn set(&self, key: &str, value: &str, max_age: Option<Duration>) -> Result<()> {
        let cookie = Cookie {
            name: key.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            expires_at: max_age.map(|age| Utc::now() + age),
            secure: self.secure,
        };
        let mut cookies = self.cookies.write();
        cookies.insert(key.to_string(), cookie);
        self.persist(&cookies)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.cookie(key).map(|cookie| cookie.value)
    }

    fn clear(&self) -> Result<()> {
        let mut cookies = self.cookies.write();
        cookies.clear();
        self.persist(&cookies)
    }

    fn is_empty(&self) -> bool {
        let now = Utc::now();
        self.cookies
            .read()
            .values()
            .all(|cookie| cookie.is_expired(now))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(None),
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write via a random temp file in the same directory, then persist over `path`.
///
/// The mirrors hold credentials, so the file is owner-only on Unix. Blocks on
/// disk I/O; async callers go through [`super::Session::run_blocking`].
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    serde_json::to_writer_pretty(tmp.as_file_mut(), value)?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    // A failed persist drops `tmp`, which removes the temp file.
    tmp.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), "Session mirror persisted");
    Ok(())
}
