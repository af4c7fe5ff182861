//! Refresh coordinator.
//!
//! Exchanges the stored refresh credential for a new access credential when a
//! protected request is rejected with 401. Concurrent 401s are coalesced: the
//! first caller performs the exchange while the others wait on the same lock
//! and then reuse its outcome instead of issuing their own refresh call.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{ApiError, Result};
use crate::models::{RefreshRequest, RefreshResponse};
use crate::notify::Navigator;
use crate::request::RequestDescriptor;
use crate::session::Session;
use crate::transport::Transport;

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Refreshing,
    /// The last exchange failed and the session was wiped. Cleared by a new login.
    Failed,
}

pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
    navigator: Arc<dyn Navigator>,
    refresh_path: String,
    login_route: String,
    phase: Mutex<RefreshPhase>,
    /// Held for the whole exchange; waiters queue here.
    lock: AsyncMutex<()>,
    /// Bumped every time an exchange finishes, successful or not.
    episode: AtomicU64,
    exchanges: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<Session>,
        navigator: Arc<dyn Navigator>,
        refresh_path: impl Into<String>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            session,
            navigator,
            refresh_path: refresh_path.into(),
            login_route: login_route.into(),
            phase: Mutex::new(RefreshPhase::Idle),
            lock: AsyncMutex::new(()),
            episode: AtomicU64::new(0),
            exchanges: AtomicU64::new(0),
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        *self.phase.lock()
    }

    /// Number of refresh calls actually sent to the server.
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    /// Return to `Idle` after a new login.
    pub fn reset(&self) {
        self.set_phase(RefreshPhase::Idle);
    }

    fn set_phase(&self, phase: RefreshPhase) {
        let mut current = self.phase.lock();
        if *current != phase {
            debug!(from = ?*current, to = ?phase, "Refresh phase transition");
            *current = phase;
        }
    }

    /// Obtain an access credential to replace `stale`, the one the rejected request carried.
    ///
    /// On failure the session has already been wiped and the navigator sent to
    /// the login route; callers only propagate the error.
    #[instrument(skip_all)]
    pub async fn refresh(&self, stale: Option<&str>) -> Result<String> {
        let seen_episode = self.episode.load(Ordering::Acquire);
        let _guard = self.lock.lock().await;

        // An exchange finished while this caller was queued.
        if self.episode.load(Ordering::Acquire) != seen_episode
            && self.phase() == RefreshPhase::Failed
        {
            debug!("Concurrent refresh already failed");
            return Err(ApiError::refresh_failed("credential refresh already failed"));
        }

        if let Some(current) = self.session.access_token()
            && stale != Some(current.as_str())
        {
            debug!("Reusing access credential refreshed by a concurrent request");
            return Ok(current);
        }

        self.set_phase(RefreshPhase::Refreshing);
        let outcome = self.exchange().await;
        self.episode.fetch_add(1, Ordering::AcqRel);

        match outcome {
            Ok(access) => {
                self.set_phase(RefreshPhase::Idle);
                info!("Access credential refreshed");
                Ok(access)
            }
            Err(e) => {
                self.set_phase(RefreshPhase::Failed);
                warn!(error = %e, "Credential refresh failed, ending session");
                if let Err(clear_err) = self.session.run_blocking(|s| s.clear()).await {
                    warn!(error = %clear_err, "Failed to clear session after refresh failure");
                }
                self.navigator.redirect(&self.login_route);
                Err(match e {
                    ApiError::RefreshFailed { .. } => e,
                    other => ApiError::refresh_failed(other.to_string()),
                })
            }
        }
    }

    async fn exchange(&self) -> Result<String> {
        let refresh = self
            .session
            .refresh_token()
            .ok_or_else(|| ApiError::refresh_failed("No refresh token available"))?;

        let request = RequestDescriptor::post(&self.refresh_path).with_json(&RefreshRequest { refresh })?;
        self.exchanges.fetch_add(1, Ordering::Relaxed);
        let response = self.transport.execute(&request).await?;

        if !response.is_success() {
            return Err(ApiError::refresh_failed(format!(
                "refresh endpoint answered {}",
                response.status
            )));
        }

        let RefreshResponse { access } = response.json()?;
        if access.is_empty() {
            return Err(ApiError::refresh_failed("refresh endpoint returned an empty credential"));
        }

        let stored = access.clone();
        self.session
            .run_blocking(move |s| s.store_access(&stored))
            .await?;
        Ok(access)
    }
}
