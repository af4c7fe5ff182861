//! HTTP transport behind the dispatcher.

use std::sync::OnceLock;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::RequestDescriptor;

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Empty,
}

impl ResponseBody {
    /// JSON when it parses, text otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Empty;
        }
        match serde_json::from_slice(bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Status plus decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: u16, body: ResponseBody) -> Self {
        Self { status, body }
    }

    pub fn json_body(status: u16, body: Value) -> Self {
        Self::new(status, ResponseBody::Json(body))
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body. An empty body decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let value = match &self.body {
            ResponseBody::Json(value) => value.clone(),
            ResponseBody::Text(text) => Value::String(text.clone()),
            ResponseBody::Empty => Value::Null,
        };
        Ok(serde_json::from_value(value)?)
    }
}

/// The underlying HTTP mechanism.
///
/// Implementations only move bytes: every non-2xx status comes back as `Ok`
/// so the client can run its refresh and classification hooks. `Err` means
/// no response was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse>;
}

/// Install the process-wide rustls crypto provider once.
pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// `reqwest`-backed transport.
pub struct ReqwestTransport {
    client: Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        install_rustls_provider();

        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse> {
        let url = self.config.endpoint(&request.path)?;

        let mut builder = self.client.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        debug!(
            method = %request.method,
            path = %request.path,
            status,
            len = bytes.len(),
            "HTTP response received"
        );

        Ok(HttpResponse::new(status, ResponseBody::from_bytes(&bytes)))
    }
}
