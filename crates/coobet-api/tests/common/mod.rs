//! Shared mocks for the client integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coobet_api::{
    ApiClient, ApiError, ClientConfig, HttpResponse, Navigator, Notifier, RequestDescriptor,
    ResponseBody, Session, Toast, ToastLevel, Transport,
};
use parking_lot::Mutex;
use serde_json::{Value, json};

type Handler = Box<dyn Fn(&RequestDescriptor) -> Result<HttpResponse, ApiError> + Send + Sync>;

/// Transport answering through a closure and recording every request.
pub struct MockTransport {
    handler: Handler,
    delays: HashMap<String, Duration>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&RequestDescriptor) -> Result<HttpResponse, ApiError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delays: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Delay responses for `path` so concurrent callers overlap.
    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RequestDescriptor> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &RequestDescriptor) -> coobet_api::Result<HttpResponse> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delays.get(&request.path) {
            tokio::time::sleep(*delay).await;
        }
        (self.handler)(request)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.toasts()
            .into_iter()
            .filter(|t| t.level == ToastLevel::Error)
            .map(|t| t.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().push(toast);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        self.routes.lock().push(route.to_string());
    }
}

pub struct Harness {
    pub client: ApiClient,
    pub transport: Arc<MockTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(transport: MockTransport) -> Self {
        let config = ClientConfig::default();
        let transport = Arc::new(transport);
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let session = Arc::new(Session::in_memory(&config));

        let client = ApiClient::builder(config)
            .transport(transport.clone())
            .session(session)
            .notifier(notifier.clone())
            .navigator(navigator.clone())
            .build()
            .expect("client builds");

        Self {
            client,
            transport,
            notifier,
            navigator,
        }
    }

    /// Harness whose session already holds `a1`/`r1`.
    pub fn logged_in(transport: MockTransport) -> Self {
        let harness = Self::new(transport);
        let login: coobet_api::models::LoginResponse =
            serde_json::from_value(login_body("a1", "r1")).unwrap();
        harness.client.session().store_login(&login).unwrap();
        harness
    }
}

pub fn ok(body: Value) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::json_body(200, body))
}

pub fn status(code: u16, body: Value) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::json_body(code, body))
}

pub fn empty(code: u16) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::new(code, ResponseBody::Empty))
}

pub fn login_body(access: &str, refresh: &str) -> Value {
    json!({
        "access": access,
        "refresh": refresh,
        "exp": "2026-10-26T00:00:00Z",
        "data": {
            "id": "42",
            "username": "ops",
            "email": "user@x.com",
            "first_name": "Awa",
            "last_name": "Diallo",
            "phone": "+22990000000",
            "is_superuser": false,
            "is_staff": true
        }
    })
}

pub fn empty_page() -> Value {
    json!({"count": 0, "next": null, "previous": null, "results": []})
}
