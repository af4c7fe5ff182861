//! Failure classification.
//!
//! Turns a non-success response into a user-facing message and decides which
//! side effects the failure gets: a toast, or a session wipe plus redirect.

use serde_json::Value;

use crate::error::ApiError;
use crate::transport::{HttpResponse, ResponseBody};

/// Server phrase that marks a permission-denied failure.
pub const PERMISSION_DENIED_PHRASE: &str = "You do not have permission to perform this action";

pub const SERVER_ERROR_MESSAGE: &str = "Erreur serveur interne. Veuillez réessayer plus tard.";
pub const NOT_FOUND_MESSAGE: &str = "Ressource non trouvée.";
pub const GENERIC_ERROR_MESSAGE: &str =
    "Une erreur inattendue s'est produite. Veuillez réessayer.";

/// Body fields searched for a server message, highest priority first.
const MESSAGE_FIELDS: [&str; 4] = ["details", "detail", "error", "message"];

const FRENCH_STOP_WORDS: [&str; 9] = ["le", "la", "une", "pas", "de", "pour", "avec", "et", "sur"];

/// Matches needed before a message is treated as French.
const FRENCH_THRESHOLD: usize = 3;

/// Display language guessed from message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    French,
    #[default]
    Default,
}

/// Guess the display language by counting French stop-words in `text`.
pub fn detect_language(text: &str) -> Language {
    let lower = text.to_lowercase();
    let matches = lower
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| FRENCH_STOP_WORDS.contains(word))
        .count();

    if matches >= FRENCH_THRESHOLD {
        Language::French
    } else {
        Language::Default
    }
}

/// Failure class, one per error variant surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unauthorized,
    PermissionDenied,
    ServerError,
    NotFound,
    Other,
    Network,
}

/// Outcome of classifying one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub message: String,
    pub should_notify: bool,
    pub should_redirect: bool,
}

impl Classification {
    /// Replace the message with an endpoint-specific one.
    ///
    /// Server errors keep their fixed message and permission-denied failures
    /// keep the server phrase.
    pub fn with_messages(mut self, messages: &FailureMessages, body: &ResponseBody) -> Self {
        if !matches!(
            self.kind,
            FailureKind::ServerError | FailureKind::PermissionDenied
        ) {
            self.message = messages.message(body);
        }
        self
    }

    /// The error handed back to the caller.
    pub fn into_error(self) -> ApiError {
        let message = self.message;
        match self.kind {
            FailureKind::Unauthorized => ApiError::Unauthorized { message },
            FailureKind::PermissionDenied => ApiError::PermissionDenied { message },
            FailureKind::ServerError => ApiError::ServerError {
                status: self.status.unwrap_or(500),
                message,
            },
            FailureKind::NotFound => ApiError::NotFound { message },
            FailureKind::Other => ApiError::Other {
                status: self.status.unwrap_or_default(),
                message,
            },
            FailureKind::Network => ApiError::Network(message),
        }
    }
}

/// First non-empty server message, searching the known fields then a raw string body.
pub fn extract_message(body: &ResponseBody) -> Option<String> {
    match body {
        ResponseBody::Json(Value::Object(map)) => MESSAGE_FIELDS
            .iter()
            .filter_map(|field| map.get(*field))
            .find_map(message_text),
        ResponseBody::Json(Value::String(text)) | ResponseBody::Text(text) => {
            non_empty(text.as_str())
        }
        _ => None,
    }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_empty(text),
        // DRF-style `["first error", ...]`
        Value::Array(items) => items.iter().find_map(message_text),
        _ => None,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Whether a server message is the permission-denied phrase.
pub fn is_permission_denied(message: &str) -> bool {
    message.contains(PERMISSION_DENIED_PHRASE)
}

/// Failure text for one mutation endpoint.
///
/// The first validation message found under `fields` wins, then `detail`,
/// then `fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureMessages {
    pub fields: &'static [&'static str],
    pub fallback: &'static str,
}

impl FailureMessages {
    pub const fn new(fields: &'static [&'static str], fallback: &'static str) -> Self {
        Self { fields, fallback }
    }

    pub fn message(&self, body: &ResponseBody) -> String {
        body.as_json()
            .and_then(|json| {
                self.fields
                    .iter()
                    .chain(std::iter::once(&"detail"))
                    .filter_map(|field| json.get(*field))
                    .find_map(message_text)
            })
            .unwrap_or_else(|| self.fallback.to_string())
    }

    /// Classification for a mutation that never got a response.
    pub fn network_failure(&self) -> Classification {
        Classification {
            message: self.fallback.to_string(),
            ..classify_network_failure()
        }
    }
}

/// Classify a non-success response.
///
/// `refresh_pending` is true when the failure is a first-attempt 401 that the
/// refresh coordinator is about to handle; such failures stay silent.
pub fn classify(response: &HttpResponse, refresh_pending: bool) -> Classification {
    let status = response.status;
    let extracted = extract_message(&response.body);

    if let Some(message) = extracted.as_deref().filter(|m| is_permission_denied(m)) {
        return Classification {
            kind: FailureKind::PermissionDenied,
            status: Some(status),
            message: message.to_string(),
            should_notify: false,
            should_redirect: true,
        };
    }

    let (kind, message) = match status {
        500.. => (FailureKind::ServerError, SERVER_ERROR_MESSAGE.to_string()),
        404 => (FailureKind::NotFound, NOT_FOUND_MESSAGE.to_string()),
        401 => (
            FailureKind::Unauthorized,
            extracted.unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
        ),
        _ => (
            FailureKind::Other,
            extracted.unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
        ),
    };

    Classification {
        kind,
        status: Some(status),
        message,
        should_notify: !(status == 401 && refresh_pending),
        should_redirect: false,
    }
}

/// Classification for a request that never got a response.
pub fn classify_network_failure() -> Classification {
    Classification {
        kind: FailureKind::Network,
        status: None,
        message: GENERIC_ERROR_MESSAGE.to_string(),
        should_notify: true,
        should_redirect: false,
    }
}
