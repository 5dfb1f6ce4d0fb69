//! Toast notifications: the user-facing outcome of every dashboard action.

use std::fmt;
use std::sync::Mutex;

use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            ToastLevel::Success => "ok",
            ToastLevel::Error => "error",
            ToastLevel::Info => "info",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Sends toasts to the log only.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error => error!(text = %toast.message, "toast"),
            ToastLevel::Success | ToastLevel::Info => info!(text = %toast.message, "toast"),
        }
    }
}

/// Prints toasts to stderr for the CLI. The log copy is at debug level so
/// it does not repeat on the same terminal.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: Toast) {
        eprintln!("{toast}");
        debug!(level = ?toast.level, text = %toast.message, "toast");
    }
}

/// Keeps every toast in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Toast> {
        self.toasts.lock().ok().and_then(|t| t.last().cloned())
    }

    pub fn clear(&self) {
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.clear();
        }
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, toast: Toast) {
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(toast);
        }
    }
}
