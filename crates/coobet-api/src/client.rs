//! Request dispatcher.
//!
//! [`ApiClient`] attaches the bearer credential, hands the request to the
//! transport and runs the response hooks:
//!
//! ```text
//! caller -> dispatch -> 2xx ------------------------------> caller
//!                    -> permission denied -> wipe + redirect -> Err
//!                    -> 401 (first attempt) -> refresh -> replay once
//!                    -> other failure -> classify -> toast -> Err
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::classify::{self, FailureKind, FailureMessages};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::notify::{Navigator, Notifier, Toast, TracingNavigator, TracingNotifier};
use crate::refresh::{RefreshCoordinator, RefreshPhase};
use crate::request::{Method, RequestAttempt, RequestDescriptor};
use crate::session::Session;
use crate::transport::{HttpResponse, ReqwestTransport, Transport};

/// Authenticated API client.
pub struct ApiClient {
    pub(crate) config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    pub(crate) session: Arc<Session>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Client with a reqwest transport, an in-memory session and log-only collaborators.
    pub fn new(config: ClientConfig) -> Result<Self> {
        ApiClientBuilder::new(config).build()
    }

    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn refresh_phase(&self) -> RefreshPhase {
        self.refresh.phase()
    }

    /// Number of refresh calls sent so far.
    pub fn refresh_count(&self) -> u64 {
        self.refresh.exchange_count()
    }

    /// Drop cached queries under `prefix` after a mutation.
    pub fn invalidate_queries(&self, prefix: &[&str]) -> usize {
        self.session.cache().invalidate(prefix)
    }

    /// Send `method path` with an optional JSON body.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<HttpResponse> {
        let mut request = RequestDescriptor::new(method, path);
        request.body = body;
        self.execute(request).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(RequestDescriptor::get(path)).await?.json()
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = RequestDescriptor::get(path).with_query(query)?;
        self.execute(request).await?.json()
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = RequestDescriptor::post(path).with_json(body)?;
        self.execute(request).await?.json()
    }

    /// POST for a mutation whose failures are reported with `messages`.
    pub(crate) async fn mutate<T, B>(
        &self,
        path: &str,
        body: &B,
        messages: &FailureMessages,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = RequestDescriptor::post(path).with_json(body)?;
        self.dispatch(request, Some(messages)).await?.json()
    }

    /// Dispatch a request through the credential and failure hooks.
    ///
    /// A request is replayed at most once, after a successful refresh.
    pub async fn execute(&self, request: RequestDescriptor) -> Result<HttpResponse> {
        self.dispatch(request, None).await
    }

    #[instrument(skip(self, request, messages), fields(method = %request.method, path = %request.path))]
    async fn dispatch(
        &self,
        request: RequestDescriptor,
        messages: Option<&FailureMessages>,
    ) -> Result<HttpResponse> {
        let exempt = self.config.is_auth_exempt(&request.path);
        let mut attempt = RequestAttempt::new(request);

        if !exempt && let Some(token) = self.session.access_token() {
            attempt.descriptor_mut().set_bearer(&token);
        }

        loop {
            let response = match self.transport.execute(attempt.descriptor()).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "Request failed before a response was received");
                    let classification = match messages {
                        Some(messages) => messages.network_failure(),
                        None => classify::classify_network_failure(),
                    };
                    self.notify_error(&classification.message);
                    return Err(e);
                }
            };

            if response.is_success() {
                debug!(status = response.status, retries = attempt.retries(), "Request succeeded");
                return Ok(response);
            }

            let refresh_pending = response.status == 401 && !exempt && attempt.can_retry();
            let mut classification = classify::classify(&response, refresh_pending);

            if classification.kind == FailureKind::PermissionDenied {
                warn!(status = response.status, "Permission denied, ending session");
                self.end_session().await;
                return Err(classification.into_error());
            }

            if refresh_pending {
                attempt.mark_retry();
                let stale = attempt.descriptor().bearer().map(str::to_owned);
                let token = self.refresh.refresh(stale.as_deref()).await?;
                attempt.descriptor_mut().set_bearer(&token);
                debug!("Replaying request with refreshed credential");
                continue;
            }

            if let Some(messages) = messages {
                classification = classification.with_messages(messages, &response.body);
            }

            debug!(
                status = response.status,
                kind = ?classification.kind,
                retried = attempt.is_retry(),
                "Request failed"
            );
            if classification.should_notify {
                self.notify_error(&classification.message);
            }
            return Err(classification.into_error());
        }
    }

    /// Wipe the session and send the operator to the login route.
    pub(crate) async fn end_session(&self) {
        if let Err(e) = self.session.run_blocking(|s| s.clear()).await {
            warn!(error = %e, "Failed to clear session");
        }
        self.navigator.redirect(&self.config.login_route);
    }

    pub(crate) fn notify_error(&self, message: &str) {
        self.notifier.notify(Toast::error(message));
    }

    pub(crate) fn notify_success(&self, message: &str) {
        self.notifier.notify(Toast::success(message));
    }
}

/// Builder for [`ApiClient`] collaborators.
pub struct ApiClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    session: Option<Arc<Session>>,
    notifier: Option<Arc<dyn Notifier>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ApiClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            session: None,
            notifier: None,
            navigator: None,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.config.clone())?),
        };
        let session = self
            .session
            .unwrap_or_else(|| Arc::new(Session::in_memory(&self.config)));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier) as Arc<dyn Notifier>);
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(TracingNavigator::new()) as Arc<dyn Navigator>);

        if self.config.login_path.is_empty() || self.config.refresh_path.is_empty() {
            return Err(ApiError::config("login and refresh paths must not be empty"));
        }

        let refresh = RefreshCoordinator::new(
            Arc::clone(&transport),
            Arc::clone(&session),
            Arc::clone(&navigator),
            self.config.refresh_path.clone(),
            self.config.login_route.clone(),
        );

        Ok(ApiClient {
            config: Arc::new(self.config),
            transport,
            session,
            notifier,
            navigator,
            refresh,
        })
    }
}
