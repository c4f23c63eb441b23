//! Entity stores - the client-side synchronization layer.
//!
//! An [`EntityStore`] owns the list of one entity kind for the signed-in user.
//! Every write goes to the remote store first and is followed by a full
//! re-fetch; the list is only ever replaced wholesale by a fresh fetch, never
//! patched in place. Public operations never return errors: failures land in
//! [`EntityStore::error`] and the previous list stays visible.
//!
//! The per-kind behavior lives behind [`SyncKind`]; see [`notes`],
//! [`payments`] and [`tags`].

/// Notes store and note-only queries
pub mod notes;
/// Payments store and payment-only queries
pub mod payments;
/// Tags store and default tag seeding
pub mod tags;

pub use notes::{Notes, NotesStore};
pub use notes::NoteStats;
pub use payments::{MonthlySpending, PaymentStats, Payments, PaymentsStore};
pub use tags::{Tags, TagsStore};

use crate::{
    errors::{Error, Result},
    notify::{FollowUp, NotificationPayload, ReminderScheduler},
    session::Session,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No user signed in; the list is empty
    Idle,
    /// A fetch is in flight
    Loading,
    /// The list reflects the last successful fetch (see `error` for failures)
    Ready,
}

/// Remote operations for one entity kind.
#[allow(async_fn_in_trait)]
pub trait SyncKind {
    /// View model held in the list
    type View: Clone;
    /// Partial view model accepted by `save`
    type Draft;

    /// Lower-case name used in messages ("note", "payment", "tag").
    const LABEL: &'static str;

    /// Key of the entity the draft updates, or `None` for a create.
    fn draft_key(draft: &Self::Draft) -> Option<&str>;

    /// Key of a listed entity, as accepted by `update`, `delete` and `toggle`.
    fn key_of(view: &Self::View) -> &str;

    /// Runs once each time a user's session starts, before the first fetch.
    async fn on_session_start(&self, _db: &DatabaseConnection, _user_id: &str) -> Result<()> {
        Ok(())
    }

    async fn fetch(&self, db: &DatabaseConnection, user_id: &str) -> Result<Vec<Self::View>>;

    async fn create(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
        draft: &Self::Draft,
    ) -> Result<Self::View>;

    async fn update(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
        key: &str,
        draft: &Self::Draft,
    ) -> Result<Self::View>;

    async fn delete(&self, db: &DatabaseConnection, user_id: &str, key: &str) -> Result<()>;

    /// Reminder to arm for `saved`, if it has one still ahead.
    fn reminder(&self, _saved: &Self::View) -> Option<(DateTime<Utc>, NotificationPayload)> {
        None
    }

    /// Scheduler tag the reminder for the entity with `key` is armed under.
    fn reminder_tag(&self, _key: &str) -> Option<String> {
        None
    }

    /// Work to run once the reminder for `view` has been shown.
    fn after_reminder(
        &self,
        _db: Arc<DatabaseConnection>,
        _user_id: String,
        _view: &Self::View,
    ) -> Option<FollowUp> {
        None
    }
}

/// Kinds with a single boolean that can be flipped in place.
#[allow(async_fn_in_trait)]
pub trait ToggleKind: SyncKind {
    /// Flips the boolean on the entity with `key`; returns the new value.
    async fn toggle(&self, db: &DatabaseConnection, user_id: &str, key: &str) -> Result<bool>;
}

/// In-memory list of one entity kind for the current user.
pub struct EntityStore<K: SyncKind> {
    kind: K,
    db: Arc<DatabaseConnection>,
    scheduler: Option<Arc<ReminderScheduler>>,
    session: Option<Session>,
    items: Vec<K::View>,
    state: SyncState,
    error: Option<String>,
}

impl<K: SyncKind> std::fmt::Debug for EntityStore<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("kind", &K::LABEL)
            .field("user", &self.session.as_ref().map(|s| &s.user_id))
            .field("items", &self.items.len())
            .field("state", &self.state)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<K: SyncKind> EntityStore<K> {
    /// Creates an idle store; nothing is fetched until a session is set.
    #[must_use]
    pub const fn new(kind: K, db: Arc<DatabaseConnection>) -> Self {
        Self {
            kind,
            db,
            scheduler: None,
            session: None,
            items: Vec::new(),
            state: SyncState::Idle,
            error: None,
        }
    }

    /// Keeps reminders for listed entities armed through `scheduler`.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Arc<ReminderScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// The list as of the last successful fetch.
    #[must_use]
    pub fn items(&self) -> &[K::View] {
        &self.items
    }

    #[must_use]
    pub const fn state(&self) -> SyncState {
        self.state
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, SyncState::Loading)
    }

    /// Message from the last failed operation, cleared by the next successful fetch.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn user_id(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.user_id.clone())
    }

    fn record_error(&mut self, action: &str, error: &Error) {
        warn!("Failed to {} {}: {}", action, K::LABEL, error);
        self.error = Some(format!("Failed to {action} {}: {error}", K::LABEL));
    }

    /// Follows the auth session. Signing in loads the user's list and arms
    /// its pending reminders; signing out clears it and returns to
    /// [`SyncState::Idle`]. Setting the current user again reloads the list.
    #[instrument(skip(self, session), fields(kind = K::LABEL))]
    pub async fn set_session(&mut self, session: Option<Session>) {
        let Some(session) = session else {
            if self.session.take().is_some() {
                info!("Session ended; clearing {} list", K::LABEL);
            }
            self.items.clear();
            self.error = None;
            self.state = SyncState::Idle;
            return;
        };

        let same_user = self
            .session
            .as_ref()
            .is_some_and(|current| current.user_id == session.user_id);
        let user_id = session.user_id.clone();
        self.session = Some(session);
        if !same_user {
            self.items.clear();
            self.error = None;
            if let Err(e) = self.kind.on_session_start(&self.db, &user_id).await {
                self.record_error("prepare", &e);
            }
        }
        self.refetch().await;
        self.arm_loaded();
    }

    /// Reloads the list from the remote store. On failure the previous list is kept.
    pub async fn refetch(&mut self) {
        let Some(user_id) = self.user_id() else {
            return;
        };
        self.state = SyncState::Loading;
        match self.kind.fetch(&self.db, &user_id).await {
            Ok(items) => {
                self.items = items;
                self.error = None;
            }
            Err(e) => self.record_error("load", &e),
        }
        self.state = SyncState::Ready;
    }

    /// Creates (draft without key) or updates (draft with key), then re-fetches.
    #[instrument(skip(self, draft), fields(kind = K::LABEL))]
    pub async fn save(&mut self, draft: K::Draft) {
        let Some(user_id) = self.user_id() else {
            debug!("No session; ignoring save");
            return;
        };

        let result = match K::draft_key(&draft) {
            Some(key) => self.kind.update(&self.db, &user_id, key, &draft).await,
            None => self.kind.create(&self.db, &user_id, &draft).await,
        };
        match result {
            Ok(saved) => {
                self.refetch().await;
                self.sync_reminder(&saved);
            }
            Err(e) => self.record_error("save", &e),
        }
    }

    /// Deletes the entity with `key` and its pending reminder, then re-fetches.
    #[instrument(skip(self), fields(kind = K::LABEL))]
    pub async fn delete(&mut self, key: &str) {
        let Some(user_id) = self.user_id() else {
            debug!("No session; ignoring delete");
            return;
        };
        match self.kind.delete(&self.db, &user_id, key).await {
            Ok(()) => {
                self.cancel_reminder(key);
                self.refetch().await;
            }
            Err(e) => self.record_error("delete", &e),
        }
    }

    /// Arms the reminder `view` has, or cancels the one armed for it.
    /// Returns whether a timer is now pending for it.
    fn sync_reminder(&self, view: &K::View) -> bool {
        let Some(scheduler) = &self.scheduler else {
            return false;
        };
        if let Some((at, payload)) = self.kind.reminder(view) {
            let follow_up = self
                .user_id()
                .and_then(|user_id| self.kind.after_reminder(Arc::clone(&self.db), user_id, view));
            if scheduler.arm_with(at, payload, follow_up) {
                return true;
            }
            debug!("Reminder for {} {} was not armed", K::LABEL, K::key_of(view));
        }
        self.cancel_reminder(K::key_of(view));
        false
    }

    /// Re-evaluates the reminder of the entity with `key` against the list.
    /// Entities that dropped out of the list lose their reminder.
    fn resync_reminder(&self, key: &str) {
        match self.items.iter().find(|view| K::key_of(view) == key) {
            Some(view) => {
                self.sync_reminder(view);
            }
            None => self.cancel_reminder(key),
        }
    }

    fn cancel_reminder(&self, key: &str) {
        let (Some(scheduler), Some(tag)) = (&self.scheduler, self.kind.reminder_tag(key)) else {
            return;
        };
        if scheduler.cancel(&tag) {
            debug!("Cancelled reminder {}", tag);
        }
    }

    fn arm_loaded(&self) {
        if self.scheduler.is_none() {
            return;
        }
        let armed = self.items.iter().filter(|view| self.sync_reminder(view)).count();
        if armed > 0 {
            info!("Armed {} {} reminders", armed, K::LABEL);
        }
    }
}

impl<K: ToggleKind> EntityStore<K> {
    /// Flips the kind's boolean on the entity with `key`, then re-fetches and
    /// re-evaluates its reminder.
    #[instrument(skip(self), fields(kind = K::LABEL))]
    pub async fn toggle(&mut self, key: &str) {
        let Some(user_id) = self.user_id() else {
            debug!("No session; ignoring toggle");
            return;
        };
        match self.kind.toggle(&self.db, &user_id, key).await {
            Ok(_) => {
                self.refetch().await;
                self.resync_reminder(key);
            }
            Err(e) => self.record_error("update", &e),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::models::NoteDraft;
    use crate::notify::{Notifier, ReminderSettings};
    use crate::test_utils::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_store_starts_idle_and_ignores_writes() -> Result<()> {
        let db = Arc::new(setup_test_db().await?);
        let mut store = NotesStore::new(Notes, Arc::clone(&db));

        assert_eq!(store.state(), SyncState::Idle);
        store.save(NoteDraft::new("Nobody home")).await;
        store.delete("anything").await;
        store.toggle("anything").await;

        assert!(store.items().is_empty());
        assert!(store.error().is_none());
        assert_eq!(store.state(), SyncState::Idle);
        assert!(
            crate::core::notes::fetch_notes(&db, TEST_USER)
                .await?
                .is_empty()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_in_loads_and_sign_out_clears() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_note(&db, TEST_USER, "Existing").await?;
        let mut store = NotesStore::new(Notes, Arc::new(db));

        store.set_session(Some(test_session())).await;
        assert_eq!(store.state(), SyncState::Ready);
        assert_eq!(store.items().len(), 1);

        store.set_session(None).await;
        assert_eq!(store.state(), SyncState::Idle);
        assert!(store.items().is_empty());
        assert!(store.error().is_none());
        assert!(store.session().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_switching_users_never_shows_previous_list() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_note(&db, TEST_USER, "Mine").await?;
        create_test_note(&db, OTHER_USER, "Theirs").await?;
        let mut store = NotesStore::new(Notes, Arc::new(db));

        store.set_session(Some(test_session())).await;
        assert_eq!(store.items()[0].title, "Mine");

        store.set_session(Some(Session::new(OTHER_USER))).await;
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].title, "Theirs");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_list() -> Result<()> {
        let db = Arc::new(setup_test_db().await?);
        create_test_note(&db, TEST_USER, "Keep me").await?;
        let mut store = NotesStore::new(Notes, Arc::clone(&db));
        store.set_session(Some(test_session())).await;
        let before = store.items().to_vec();

        break_table(&db, "notes").await?;
        store.refetch().await;

        assert_eq!(store.items(), before.as_slice());
        assert!(store.error().unwrap().starts_with("Failed to load note"));
        assert_eq!(store.state(), SyncState::Ready);
        Ok(())
    }

    #[tokio::test]
    async fn test_setting_same_user_again_reloads_and_clears_error() -> Result<()> {
        let db = Arc::new(setup_test_db().await?);
        let mut store = NotesStore::new(Notes, Arc::clone(&db));
        store.set_session(Some(test_session())).await;

        store.save(NoteDraft::new("  ")).await;
        assert!(store.error().is_some());
        create_test_note(&db, TEST_USER, "Written elsewhere").await?;

        store.set_session(Some(test_session())).await;
        assert!(store.error().is_none());
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.state(), SyncState::Ready);
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_in_arms_loaded_reminders() -> Result<()> {
        let db = Arc::new(setup_test_db().await?);
        let soon = Utc::now() + Duration::hours(2);
        crate::core::notes::create_note(&db, TEST_USER, &NoteDraft::new("Call").remind_at(soon))
            .await?;
        crate::core::notes::create_note(
            &db,
            TEST_USER,
            &NoteDraft::new("Missed").remind_at(Utc::now() - Duration::hours(2)),
        )
        .await?;
        create_test_note(&db, TEST_USER, "Plain").await?;
        let scheduler = Arc::new(ReminderScheduler::new(
            Arc::new(RecordingNotifier::granted()) as Arc<dyn Notifier>,
            ReminderSettings::default(),
        ));
        let mut store = NotesStore::new(Notes, db).with_scheduler(Arc::clone(&scheduler));

        store.set_session(Some(test_session())).await;

        assert_eq!(store.items().len(), 3);
        assert_eq!(scheduler.pending_count(), 1);
        Ok(())
    }
}
