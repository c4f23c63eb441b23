//! Notification layer - the platform notification collaborator and the
//! best-effort reminder scheduler built on top of it.

/// Single-shot reminder timers
pub mod scheduler;

pub use scheduler::{FollowUp, ReminderScheduler, ReminderSettings};

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::info;

/// Whether the platform lets us display notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// The user has not been asked yet
    #[default]
    Default,
    /// Notifications may be shown
    Granted,
    /// The user refused
    Denied,
}

/// What a notification shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    /// Notifications with the same tag replace each other
    pub tag: Option<String>,
    /// Keep the notification on screen until dismissed
    pub require_interaction: bool,
}

impl NotificationPayload {
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tag: None,
            require_interaction: false,
        }
    }

    #[must_use]
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Tag of the reminder for the note with `note_id`.
    #[must_use]
    pub fn note_tag(note_id: &str) -> String {
        format!("note-{note_id}")
    }

    /// Tag of the reminder for the payment with `payment_id`.
    #[must_use]
    pub fn payment_tag(payment_id: &str) -> String {
        format!("payment-{payment_id}")
    }

    /// Payload for a note reminder.
    #[must_use]
    pub fn note_reminder(note_id: &str, title: &str) -> Self {
        Self {
            require_interaction: true,
            ..Self::new(format!("📝 {title}"), "You have a note reminder!")
                .tagged(Self::note_tag(note_id))
        }
    }

    /// Payload for a payment reminder.
    #[must_use]
    pub fn payment_reminder(payment_id: &str, title: &str, amount: &str) -> Self {
        Self {
            require_interaction: true,
            ..Self::new(format!("💳 {title}"), format!("{amount} payment is due soon!"))
                .tagged(Self::payment_tag(payment_id))
        }
    }
}

/// Platform notification API.
///
/// Implementations must be cheap to call from a timer task.
pub trait Notifier: Send + Sync {
    /// Current permission state.
    fn permission(&self) -> Permission;

    /// Prompts the user and returns the resulting state.
    fn request_permission(&self) -> Permission;

    /// Displays a notification.
    fn show(&self, payload: &NotificationPayload) -> Result<()>;
}

/// Notifier for headless runs: notifications are written to the log.
#[derive(Debug)]
pub struct TracingNotifier {
    permission: Mutex<Permission>,
    grant_on_request: bool,
}

impl TracingNotifier {
    /// `grant_on_request` decides what the simulated permission prompt answers.
    #[must_use]
    pub const fn new(grant_on_request: bool) -> Self {
        Self {
            permission: Mutex::new(Permission::Default),
            grant_on_request,
        }
    }
}

impl Notifier for TracingNotifier {
    fn permission(&self) -> Permission {
        self.permission
            .lock()
            .map_or(Permission::Denied, |permission| *permission)
    }

    fn request_permission(&self) -> Permission {
        let answer = if self.grant_on_request {
            Permission::Granted
        } else {
            Permission::Denied
        };
        match self.permission.lock() {
            Ok(mut permission) => {
                *permission = answer;
                answer
            }
            Err(_) => Permission::Denied,
        }
    }

    fn show(&self, payload: &NotificationPayload) -> Result<()> {
        info!(
            tag = payload.tag.as_deref().unwrap_or("-"),
            "{}: {}", payload.title, payload.body
        );
        Ok(())
    }
}
