//! Notification and navigation collaborators.

use parking_lot::Mutex;
use tracing::{error, info};

use crate::classify::{Language, detect_language};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

/// Presentation hints for a toast. Every message uses the same style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastStyle {
    pub direction: &'static str,
    pub font_family: &'static str,
}

impl Default for ToastStyle {
    fn default() -> Self {
        Self {
            direction: "ltr",
            font_family: "sans-serif",
        }
    }
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub language: Language,
    pub style: ToastStyle,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            level,
            language: detect_language(&message),
            message,
            style: ToastStyle::default(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Error, message)
    }
}

/// Fire-and-forget toast surface.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Navigation primitive used to send the operator to another route.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Notifier that writes toasts to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Success => info!(message = %toast.message, "toast"),
            ToastLevel::Error => error!(message = %toast.message, "toast"),
        }
    }
}

/// Navigator that logs redirects and remembers the last route.
#[derive(Debug, Default)]
pub struct TracingNavigator {
    last_route: Mutex<Option<String>>,
}

impl TracingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_route(&self) -> Option<String> {
        self.last_route.lock().clone()
    }
}

impl Navigator for TracingNavigator {
    fn redirect(&self, route: &str) {
        info!(%route, "Redirecting");
        *self.last_route.lock() = Some(route.to_string());
    }
}
