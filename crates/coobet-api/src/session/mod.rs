//! Credential store.
//!
//! A [`Session`] holds the access/refresh credentials and the operator profile
//! in two mirrors (client-local and server-readable cookies) plus the query
//! cache. Every write goes to both mirrors under one lock so they never
//! diverge; a write that fails on either mirror wipes both.
//! [`Session::clear`] wipes both mirrors and the cache.

mod mirror;

use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::QueryCache;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::{LoginResponse, UserProfile};

pub use mirror::{Cookie, CookieJar, LocalStore, SessionMirror};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_DATA_KEY: &str = "user_data";

/// File names used by [`Session::persistent`].
pub const LOCAL_STORE_FILE: &str = "local.json";
pub const COOKIE_JAR_FILE: &str = "cookies.json";

/// Point-in-time copy of the client-local mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
}

impl SessionSnapshot {
    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Session context shared by the client, the refresh coordinator and callers.
pub struct Session {
    local: Arc<dyn SessionMirror>,
    server: Arc<dyn SessionMirror>,
    cache: QueryCache,
    access_max_age: Duration,
    refresh_max_age: Duration,
    /// Serializes multi-mirror writes.
    write_lock: Mutex<()>,
}

impl Session {
    pub fn new(
        config: &ClientConfig,
        local: Arc<dyn SessionMirror>,
        server: Arc<dyn SessionMirror>,
    ) -> Self {
        Self {
            local,
            server,
            cache: QueryCache::new(),
            access_max_age: config.access_max_age,
            refresh_max_age: config.refresh_max_age,
            write_lock: Mutex::new(()),
        }
    }

    /// Session that lives only as long as the process.
    pub fn in_memory(config: &ClientConfig) -> Self {
        Self::new(
            config,
            Arc::new(LocalStore::new()),
            Arc::new(CookieJar::new(config.secure_cookies)),
        )
    }

    /// Session persisted under `dir` (`local.json` + `cookies.json`).
    pub fn persistent(config: &ClientConfig, dir: &Path) -> Result<Self> {
        let local = LocalStore::open(dir.join(LOCAL_STORE_FILE))?;
        let server = CookieJar::open(dir.join(COOKIE_JAR_FILE), config.secure_cookies)?;
        debug!(dir = %dir.display(), "Opened persistent session");
        Ok(Self::new(config, Arc::new(local), Arc::new(server)))
    }

    pub fn local(&self) -> &dyn SessionMirror {
        self.local.as_ref()
    }

    pub fn server(&self) -> &dyn SessionMirror {
        self.server.as_ref()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Store credentials and profile from a successful login.
    pub fn store_login(&self, login: &LoginResponse) -> Result<()> {
        let credentials = login.credentials();
        let user_data = serde_json::to_string(&login.data)?;
        self.write(&[
            (ACCESS_TOKEN_KEY, &credentials.access, self.access_max_age),
            (REFRESH_TOKEN_KEY, &credentials.refresh, self.refresh_max_age),
            (USER_DATA_KEY, &user_data, self.refresh_max_age),
        ])?;
        info!(user_id = %login.data.id, "Session stored");
        Ok(())
    }

    /// Overwrite the access credential after a refresh.
    pub fn store_access(&self, access: &str) -> Result<()> {
        self.write(&[(ACCESS_TOKEN_KEY, access, self.access_max_age)])
    }

    /// Run a session operation on the blocking pool.
    ///
    /// File-backed mirrors write to disk while holding the session lock, so
    /// async callers go through here.
    pub async fn run_blocking<T, F>(self: &Arc<Self>, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Session) -> Result<T> + Send + 'static,
    {
        let session = Arc::clone(self);
        tokio::task::spawn_blocking(move || op(&session))
            .await
            .map_err(std::io::Error::other)?
    }

    pub fn access_token(&self) -> Option<String> {
        self.local.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.local.get(REFRESH_TOKEN_KEY)
    }

    /// Cached profile; a corrupt entry reads as no profile.
    pub fn user(&self) -> Option<UserProfile> {
        parse_user(&self.local.get(USER_DATA_KEY)?)
    }

    /// Read credentials and profile without interleaving with a write.
    pub fn snapshot(&self) -> SessionSnapshot {
        let _guard = self.write_lock.lock();
        SessionSnapshot {
            access_token: self.local.get(ACCESS_TOKEN_KEY),
            refresh_token: self.local.get(REFRESH_TOKEN_KEY),
            user: self.local.get(USER_DATA_KEY).as_deref().and_then(parse_user),
        }
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Wipe both mirrors and the query cache.
    ///
    /// Both mirrors are cleared even if the first one fails; the first error is returned.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.clear_locked()
    }

    fn clear_locked(&self) -> Result<()> {
        let local = self.local.clear();
        let server = self.server.clear();
        self.cache.clear();
        info!("Session cleared");
        local.and(server)
    }

    /// Write every entry to both mirrors.
    ///
    /// A failed write wipes both mirrors: a half-written session must not
    /// stay usable.
    fn write(&self, entries: &[(&str, &str, Duration)]) -> Result<()> {
        let _guard = self.write_lock.lock();
        for &(key, value, max_age) in entries {
            for mirror in [&self.local, &self.server] {
                if let Err(e) = mirror.set(key, value, Some(max_age)) {
                    warn!(mirror = mirror.name(), key, error = %e, "Mirror write failed, wiping session");
                    if let Err(clear_err) = self.clear_locked() {
                        warn!(error = %clear_err, "Failed to clear session after write failure");
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

fn parse_user(raw: &str) -> Option<UserProfile> {
    match serde_json::from_str(raw) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable cached profile");
            None
        }
    }
}
