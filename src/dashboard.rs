//! Dashboard - the three entity stores behind one session.
//!
//! The dashboard holds the notes, payments and tags stores for the signed-in
//! user together with the reminder scheduler they share. It is the context a
//! front end keeps for the lifetime of the app.

use crate::{
    config::settings::AppSettings,
    models::NoteDraft,
    notify::{Notifier, ReminderScheduler},
    session::Session,
    sync::{Notes, NotesStore, Payments, PaymentsStore, Tags, TagsStore},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument};

/// Counts shown at the top of the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardSummary {
    /// Active notes
    pub notes: usize,
    /// Pinned active notes
    pub pinned_notes: usize,
    /// All payments
    pub payments: usize,
    /// Payments not yet paid
    pub unpaid_payments: usize,
    /// Unpaid payments past their due date
    pub overdue_payments: usize,
    /// Unpaid payments due in the next seven days
    pub due_this_week: usize,
    /// Tags in the user's set
    pub tags: usize,
}

impl fmt::Display for DashboardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} notes ({} pinned), {} payments ({} unpaid, {} overdue, {} due this week), {} tags",
            self.notes,
            self.pinned_notes,
            self.payments,
            self.unpaid_payments,
            self.overdue_payments,
            self.due_this_week,
            self.tags
        )
    }
}

/// Notes, payments and tags for one user.
#[derive(Debug)]
pub struct Dashboard {
    /// Active notes
    pub notes: NotesStore,
    /// Payments, earliest due first
    pub payments: PaymentsStore,
    /// The user's tag set
    pub tags: TagsStore,
    scheduler: Arc<ReminderScheduler>,
}

impl Dashboard {
    /// Idle stores over `db` sharing one scheduler; nothing loads until a
    /// session is set.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        settings: &AppSettings,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let scheduler = Arc::new(ReminderScheduler::new(notifier, settings.reminders));
        Self {
            notes: NotesStore::new(Notes, Arc::clone(&db)).with_scheduler(Arc::clone(&scheduler)),
            payments: PaymentsStore::new(Payments, Arc::clone(&db))
                .with_scheduler(Arc::clone(&scheduler)),
            tags: TagsStore::new(Tags::new(settings.seed_tags()), db),
            scheduler,
        }
    }

    /// Scheduler shared by the note and payment stores.
    #[must_use]
    pub const fn scheduler(&self) -> &Arc<ReminderScheduler> {
        &self.scheduler
    }

    /// Hands the session to every store. Tags load first so a new user's
    /// defaults exist before notes are shown. Signing out or switching users
    /// cancels the reminders armed for the previous user before the new
    /// user's reminders are armed.
    #[instrument(skip_all)]
    pub async fn set_session(&mut self, session: Option<Session>) {
        let previous = self.notes.session().map(|s| s.user_id.as_str());
        if previous != session.as_ref().map(|s| s.user_id.as_str()) {
            self.scheduler.cancel_all();
        }
        self.tags.set_session(session.clone()).await;
        self.notes.set_session(session.clone()).await;
        self.payments.set_session(session).await;
    }

    /// Waits for the next session change and applies it. Returns `false`
    /// once the session publisher is gone.
    pub async fn follow_session(&mut self, sessions: &mut watch::Receiver<Option<Session>>) -> bool {
        if sessions.changed().await.is_err() {
            return false;
        }
        let session = sessions.borrow_and_update().clone();
        self.set_session(session).await;
        true
    }

    /// Saves a note, taking the tag color from the user's tag set when the
    /// draft names a tag without a color.
    pub async fn save_note(&mut self, mut draft: NoteDraft) {
        if draft.tag_color.is_none() {
            if let Some(color) = draft.tag.as_deref().and_then(|tag| self.tags.color_of(tag)) {
                draft.tag_color = Some(color.to_string());
            }
        }
        self.notes.save(draft).await;
    }

    /// First error reported by any store.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.tags
            .error()
            .or_else(|| self.notes.error())
            .or_else(|| self.payments.error())
    }

    /// Counts over the loaded lists as of `now`.
    #[must_use]
    pub fn summary(&self, now: DateTime<Utc>) -> DashboardSummary {
        let stats = self.payments.stats(now);
        DashboardSummary {
            notes: self.notes.items().len(),
            pinned_notes: self.notes.items().iter().filter(|n| n.is_pinned).count(),
            payments: stats.count,
            unpaid_payments: self.payments.items().iter().filter(|p| !p.is_paid).count(),
            overdue_payments: stats.overdue_count,
            due_this_week: stats.upcoming,
            tags: self.tags.items().len(),
        }
    }

    /// Logs the summary at info level.
    pub fn log_summary(&self) {
        info!("Dashboard: {}", self.summary(Utc::now()));
    }
}
