//! # Notifications
//!
//! User-facing messages raised by encounter operations. Delivery is fire-and-forget.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// How prominently a notification should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: Option<String>,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            severity: Severity::Info,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Receives notifications.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        let body = notification.body.as_deref().unwrap_or("");
        match notification.severity {
            Severity::Error => log::error!("{} {}", notification.title, body),
            Severity::Info | Severity::Success => log::info!("{} {}", notification.title, body),
        }
    }
}

/// Keeps every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the notifications received so far.
    pub fn received(&self) -> Vec<Notification> {
        self.received.borrow().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.received.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.received.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.borrow().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received.borrow_mut().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        assert!(notifier.is_empty());

        notifier.notify(Notification::new("Encounter saved"));
        notifier.notify(
            Notification::new("Failed")
                .with_body("no monsters")
                .with_severity(Severity::Error),
        );

        assert_eq!(notifier.len(), 2);
        let last = notifier.last().unwrap();
        assert_eq!(last.body.as_deref(), Some("no monsters"));
        assert_eq!(last.severity, Severity::Error);
    }
}
