//! User-facing notifications.
//!
//! Warnings such as "no fields selected" are not errors: the explorer emits a
//! [`Notification`] through a [`NotificationSink`] and carries on. Front ends
//! pick the sink that suits them (log lines, a channel feeding a toast
//! widget, a recorder in tests).

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

/// Display severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    /// A fetch was requested with no fields chosen
    NoFieldsSelected,
    /// The backend reported zero rows for the current object
    NoRecordsFound,
    /// Export was requested with no rows selected
    NoRowsSelectedForExport,
}

/// A title/message/severity triple for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(kind: NotificationKind) -> Self {
        let (title, message) = match kind {
            NotificationKind::NoFieldsSelected => {
                ("No Fields Selected", "Select any/all fields to fetch data")
            }
            NotificationKind::NoRecordsFound => {
                ("No Records found", "Select any/all fields to fetch data")
            }
            NotificationKind::NoRowsSelectedForExport => (
                "No rows selected",
                "Please select any/all rows to export data",
            ),
        };
        Self {
            kind,
            title: title.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Receives notifications from the explorer
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info | Severity::Success => info!("{}", notification),
            Severity::Warning => warn!("{}", notification),
            Severity::Error => error!("{}", notification),
        }
    }
}

/// Forwards notifications over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<Notification>) -> Self {
        Self { sender }
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        // Receiver gone means nobody is displaying toasts anymore
        let _ = self.sender.send(notification);
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kinds received so far, oldest first
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.received
            .lock()
            .map(|list| list.iter().map(|n| n.kind).collect())
            .unwrap_or_default()
    }

    /// Drain the recorded notifications
    pub fn take(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|mut list| std::mem::take(&mut *list))
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        if let Ok(mut list) = self.received.lock() {
            list.push(notification);
        }
    }
}
