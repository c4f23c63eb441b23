//! Reminder scheduler - fires a notification at a target instant.
//!
//! Timers are plain tokio tasks owned by the scheduler. Nothing is persisted:
//! a reminder armed in a process that exits (or a scheduler that is dropped)
//! never fires, and there is no catch-up on the next start.

use super::{NotificationPayload, Notifier, Permission};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// User-facing reminder preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// Master switch; when off, nothing is ever armed
    pub enabled: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Work a timer runs after its notification has been shown.
pub type FollowUp = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Arms single-shot notification timers.
pub struct ReminderScheduler {
    notifier: Arc<dyn Notifier>,
    settings: ReminderSettings,
    pending: Mutex<HashMap<String, JoinHandle<()>>>,
    untagged: AtomicU64,
}

impl std::fmt::Debug for ReminderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderScheduler")
            .field("settings", &self.settings)
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

/// Shows `payload`; returns whether it reached the user.
fn fire(notifier: &dyn Notifier, payload: &NotificationPayload) -> bool {
    if notifier.permission() != Permission::Granted {
        debug!("Notification permission not granted; dropping '{}'", payload.title);
        return false;
    }
    match notifier.show(payload) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to show notification '{}': {}", payload.title, e);
            false
        }
    }
}

impl ReminderScheduler {
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, settings: ReminderSettings) -> Self {
        Self {
            notifier,
            settings,
            pending: Mutex::new(HashMap::new()),
            untagged: AtomicU64::new(0),
        }
    }

    /// Current reminder preferences.
    #[must_use]
    pub const fn settings(&self) -> ReminderSettings {
        self.settings
    }

    /// Asks the platform for notification permission. Once the user has
    /// answered, the stored answer is returned without prompting again.
    pub fn request_permission(&self) -> Permission {
        match self.notifier.permission() {
            Permission::Default => {
                let answer = self.notifier.request_permission();
                info!("Notification permission: {:?}", answer);
                answer
            }
            answered => answered,
        }
    }

    /// Arms a timer that shows `payload` at `at`.
    ///
    /// Returns `false` and schedules nothing when `at` is not in the future,
    /// reminders are disabled, or no tokio runtime is running. A pending timer
    /// with the same payload tag is replaced.
    pub fn arm(&self, at: DateTime<Utc>, payload: NotificationPayload) -> bool {
        self.arm_with(at, payload, None)
    }

    /// Like [`Self::arm`], and runs `follow_up` once the notification has
    /// been shown. A dropped or denied notification skips it.
    #[instrument(skip(self, payload, follow_up), fields(title = %payload.title))]
    pub fn arm_with(
        &self,
        at: DateTime<Utc>,
        payload: NotificationPayload,
        follow_up: Option<FollowUp>,
    ) -> bool {
        if !self.settings.enabled {
            debug!("Reminders disabled; not arming");
            return false;
        }
        let delay = match (at - Utc::now()).to_std() {
            Ok(delay) if !delay.is_zero() => delay,
            _ => {
                debug!("Reminder time {} is not in the future", at);
                return false;
            }
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime available; reminder not armed");
            return false;
        };

        let key = payload.tag.clone().unwrap_or_else(|| {
            format!("reminder-{}", self.untagged.fetch_add(1, Ordering::Relaxed))
        });
        let notifier = Arc::clone(&self.notifier);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if fire(notifier.as_ref(), &payload) {
                if let Some(follow_up) = follow_up {
                    follow_up.await;
                }
            }
        });

        match self.pending.lock() {
            Ok(mut pending) => {
                pending.retain(|_, task| !task.is_finished());
                if let Some(previous) = pending.insert(key, handle) {
                    previous.abort();
                }
            }
            // The timer still runs; it just can no longer be cancelled.
            Err(_) => warn!("Reminder table poisoned; timer detached"),
        }
        debug!("Reminder armed for {} ({:?} from now)", at, delay);
        true
    }

    /// Cancels the pending timer registered under `tag`.
    pub fn cancel(&self, tag: &str) -> bool {
        self.pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.remove(tag))
            .is_some_and(|task| {
                task.abort();
                true
            })
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            for (_, task) in pending.drain() {
                task.abort();
            }
        }
    }

    /// Number of timers that have not fired yet.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map_or(0, |pending| {
            pending.values().filter(|task| !task.is_finished()).count()
        })
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
