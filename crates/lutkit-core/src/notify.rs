//! Notification channel.
//!
//! Every successful export produces one success message naming the written
//! file, and every fatal failure produces one error message before the
//! error is returned. The transport is up to the [`Notifier`]
//! implementation; [`TracingNotifier`] routes both to `tracing`.

use std::sync::Mutex;

/// Receives user-facing export messages.
pub trait Notifier: Send + Sync {
    /// Export finished.
    fn success(&self, message: &str);
    /// Export failed.
    fn error(&self, message: &str);
}

/// Notifier that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// A message captured by [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Success message
    Success(String),
    /// Error message
    Error(String),
}

/// Notifier that keeps messages in memory, e.g. for a UI status bar.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// Empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains the captured messages.
    pub fn take(&self) -> Vec<Notification> {
        match self.messages.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn push(&self, n: Notification) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push(n),
            Err(poisoned) => poisoned.into_inner().push(n),
        }
    }
}

impl Notifier for MemoryNotifier {
    fn success(&self, message: &str) {
        self.push(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Notification::Error(message.to_string()));
    }
}
