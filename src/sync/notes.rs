use super::{EntityStore, SyncKind, ToggleKind};
use crate::{
    core::notes,
    errors::Result,
    models::{Note, NoteDraft},
    notify::NotificationPayload,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Note kind: the pinned flag is its toggle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Notes;

/// Active notes of the signed-in user, pinned first then most recently updated.
pub type NotesStore = EntityStore<Notes>;

impl SyncKind for Notes {
    type View = Note;
    type Draft = NoteDraft;

    const LABEL: &'static str = "note";

    fn draft_key(draft: &NoteDraft) -> Option<&str> {
        draft.id.as_deref()
    }

    fn key_of(note: &Note) -> &str {
        &note.id
    }

    async fn fetch(&self, db: &DatabaseConnection, user_id: &str) -> Result<Vec<Note>> {
        notes::fetch_notes(db, user_id).await
    }

    async fn create(&self, db: &DatabaseConnection, user_id: &str, draft: &NoteDraft) -> Result<Note> {
        notes::create_note(db, user_id, draft).await
    }

    async fn update(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
        key: &str,
        draft: &NoteDraft,
    ) -> Result<Note> {
        notes::update_note(db, user_id, key, draft).await
    }

    async fn delete(&self, db: &DatabaseConnection, user_id: &str, key: &str) -> Result<()> {
        notes::delete_note(db, user_id, key).await
    }

    fn reminder(&self, saved: &Note) -> Option<(DateTime<Utc>, NotificationPayload)> {
        let at = saved.reminder_time.filter(|at| *at > Utc::now())?;
        Some((at, NotificationPayload::note_reminder(&saved.id, &saved.title)))
    }

    fn reminder_tag(&self, key: &str) -> Option<String> {
        Some(NotificationPayload::note_tag(key))
    }
}

impl ToggleKind for Notes {
    async fn toggle(&self, db: &DatabaseConnection, user_id: &str, key: &str) -> Result<bool> {
        notes::toggle_pin(db, user_id, key).await
    }
}

/// Counts over all of a user's notes, archived ones included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteStats {
    /// Active and archived notes
    pub total: usize,
    /// Pinned notes, archived or not
    pub pinned: usize,
    /// Notes in the archive
    pub archived: usize,
    /// Notes in the main list
    pub active: usize,
    /// Notes created in the seven days before `now`
    pub this_week: usize,
    /// Distinct non-blank tag names in use
    pub unique_tags: usize,
}

impl EntityStore<Notes> {
    /// Pins or unpins the note with `id`.
    pub async fn toggle_pin(&mut self, id: &str) {
        self.toggle(id).await;
    }

    /// Moves the note with `id` into or out of the archive. Archived notes
    /// drop out of [`EntityStore::items`] after the re-fetch and their
    /// reminder is cancelled; a restored note gets its reminder back.
    #[instrument(skip(self))]
    pub async fn toggle_archive(&mut self, id: &str) {
        let Some(user_id) = self.user_id() else {
            debug!("No session; ignoring archive");
            return;
        };
        match notes::toggle_archive(&self.db, &user_id, id).await {
            Ok(_) => {
                self.refetch().await;
                self.resync_reminder(id);
            }
            Err(e) => self.record_error("archive", &e),
        }
    }

    /// Loads the archive. Not cached: the store only tracks active notes.
    pub async fn archived(&mut self) -> Vec<Note> {
        let Some(user_id) = self.user_id() else {
            return Vec::new();
        };
        match notes::fetch_archived_notes(&self.db, &user_id).await {
            Ok(archived) => archived,
            Err(e) => {
                self.record_error("load archived", &e);
                Vec::new()
            }
        }
    }

    /// Counts over the active list plus the archive, which is loaded for it.
    pub async fn stats(&mut self, now: DateTime<Utc>) -> NoteStats {
        let archived = self.archived().await;
        let week_ago = now - Duration::days(7);
        let all = || self.items.iter().chain(archived.iter());

        NoteStats {
            total: self.items.len() + archived.len(),
            pinned: all().filter(|note| note.is_pinned).count(),
            archived: archived.len(),
            active: self.items.len(),
            this_week: all().filter(|note| note.created_at >= week_ago).count(),
            unique_tags: all()
                .map(|note| note.tag.trim())
                .filter(|tag| !tag.is_empty())
                .collect::<HashSet<_>>()
                .len(),
        }
    }

    /// Case-insensitive match on title, body and checklist items.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Note> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.items.iter().collect();
        }
        self.items
            .iter()
            .filter(|note| {
                note.title.to_lowercase().contains(&query)
                    || note.description.to_lowercase().contains(&query)
                    || note
                        .checklist
                        .iter()
                        .any(|item| item.title.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Notes filed under `tag`.
    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Vec<&Note> {
        self.items.iter().filter(|note| note.tag == tag).collect()
    }

    /// Notes with a reminder still ahead of `now`, soonest first.
    #[must_use]
    pub fn upcoming_reminders(&self, now: DateTime<Utc>) -> Vec<&Note> {
        let mut upcoming: Vec<&Note> = self
            .items
            .iter()
            .filter(|note| note.reminder_time.is_some_and(|at| at > now))
            .collect();
        upcoming.sort_by_key(|note| note.reminder_time);
        upcoming
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::models::ChecklistItem;
    use crate::notify::{Notifier, ReminderScheduler, ReminderSettings};
    use crate::test_utils::*;
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    async fn signed_in_store() -> Result<NotesStore> {
        let db = setup_test_db().await?;
        let mut store = NotesStore::new(Notes, Arc::new(db));
        store.set_session(Some(test_session())).await;
        Ok(store)
    }

    async fn store_with_scheduler()
    -> Result<(NotesStore, Arc<ReminderScheduler>, Arc<RecordingNotifier>)> {
        let notifier = Arc::new(RecordingNotifier::granted());
        let scheduler = Arc::new(ReminderScheduler::new(
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            ReminderSettings::default(),
        ));
        let db = setup_test_db().await?;
        let mut store = NotesStore::new(Notes, Arc::new(db)).with_scheduler(Arc::clone(&scheduler));
        store.set_session(Some(test_session())).await;
        Ok((store, scheduler, notifier))
    }

    #[tokio::test]
    async fn test_save_creates_and_lists_note() -> Result<()> {
        let mut store = signed_in_store().await?;

        store
            .save(
                NoteDraft::new("Groceries")
                    .description("milk")
                    .tag("Shopping")
                    .tag_color("#EF4444"),
            )
            .await;

        assert!(store.error().is_none());
        assert_eq!(store.items().len(), 1);
        let note = &store.items()[0];
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.tag, "Shopping");
        assert!(!note.is_pinned);
        assert!(note.checklist.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_save_keeps_list_and_sets_error() -> Result<()> {
        let mut store = signed_in_store().await?;
        store.save(NoteDraft::new("Keep")).await;
        let before = store.items().to_vec();

        store.save(NoteDraft::new("   ")).await;

        assert_eq!(store.items(), before.as_slice());
        assert!(store.error().unwrap().starts_with("Failed to save note"));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_preserves_unspecified_fields() -> Result<()> {
        let mut store = signed_in_store().await?;
        store
            .save(
                NoteDraft::new("Trip")
                    .description("pack")
                    .checklist(vec![ChecklistItem::new("passport")]),
            )
            .await;
        let id = store.items()[0].id.clone();

        store.save(NoteDraft::edit(&id).title("Trip to Izmir")).await;

        let note = &store.items()[0];
        assert_eq!(note.title, "Trip to Izmir");
        assert_eq!(note.description, "pack");
        assert_eq!(note.checklist.len(), 1);
        assert!(note.updated_at >= note.created_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_pin_moves_note_first() -> Result<()> {
        let mut store = signed_in_store().await?;
        store.save(NoteDraft::new("Older")).await;
        store.save(NoteDraft::new("Newer")).await;
        let older = store
            .items()
            .iter()
            .find(|n| n.title == "Older")
            .unwrap()
            .clone();

        store.toggle_pin(&older.id).await;

        let first = &store.items()[0];
        assert_eq!(first.id, older.id);
        assert!(first.is_pinned);
        assert_eq!(first.updated_at, older.updated_at);
        assert_eq!(first.title, older.title);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_note_sets_error() -> Result<()> {
        let mut store = signed_in_store().await?;
        store.save(NoteDraft::new("Stay")).await;

        store.delete("no-such-note").await;

        assert_eq!(store.items().len(), 1);
        assert!(store.error().unwrap().starts_with("Failed to delete note"));

        let id = store.items()[0].id.clone();
        store.delete(&id).await;
        assert!(store.items().is_empty());
        assert!(store.error().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_archive_and_queries() -> Result<()> {
        let mut store = signed_in_store().await?;
        store
            .save(
                NoteDraft::new("Shopping list")
                    .tag("Shopping")
                    .checklist(vec![ChecklistItem::new("Bread")]),
            )
            .await;
        store.save(NoteDraft::new("Standup").tag("Work")).await;

        assert_eq!(store.search("bread").len(), 1);
        assert_eq!(store.search("").len(), 2);
        assert_eq!(store.by_tag("Work")[0].title, "Standup");

        let id = store.by_tag("Work")[0].id.clone();
        store.toggle_archive(&id).await;
        assert_eq!(store.items().len(), 1);

        let archived = store.archived().await;
        assert_eq!(archived.len(), 1);
        assert!(archived[0].is_archived);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_with_future_reminder_arms_timer() -> Result<()> {
        let (mut store, scheduler, _) = store_with_scheduler().await?;

        store
            .save(NoteDraft::new("Dentist").remind_at(Utc::now() + Duration::hours(1)))
            .await;
        store
            .save(NoteDraft::new("Missed").remind_at(Utc::now() - Duration::hours(1)))
            .await;

        assert_eq!(store.items().len(), 2);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(store.upcoming_reminders(Utc::now()).len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_and_cleared_reminders_never_fire() -> Result<()> {
        let (mut store, scheduler, notifier) = store_with_scheduler().await?;
        let soon = Utc::now() + Duration::milliseconds(800);
        store.save(NoteDraft::new("Deleted").remind_at(soon)).await;
        store.save(NoteDraft::new("Cleared").remind_at(soon)).await;
        assert_eq!(scheduler.pending_count(), 2);
        let id_of = |store: &NotesStore, title: &str| {
            store.items().iter().find(|n| n.title == title).unwrap().id.clone()
        };

        let deleted = id_of(&store, "Deleted");
        store.delete(&deleted).await;
        let cleared = id_of(&store, "Cleared");
        store.save(NoteDraft::edit(&cleared).clear_reminder()).await;

        assert_eq!(scheduler.pending_count(), 0);
        tokio::time::sleep(StdDuration::from_millis(1200)).await;
        assert!(notifier.shown().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_archive_cancels_reminder_and_restore_rearms() -> Result<()> {
        let (mut store, scheduler, _) = store_with_scheduler().await?;
        store
            .save(NoteDraft::new("Renew passport").remind_at(Utc::now() + Duration::days(1)))
            .await;
        let id = store.items()[0].id.clone();
        assert_eq!(scheduler.pending_count(), 1);

        store.toggle_archive(&id).await;
        assert!(store.items().is_empty());
        assert_eq!(scheduler.pending_count(), 0);

        store.toggle_archive(&id).await;
        assert_eq!(store.items().len(), 1);
        assert_eq!(scheduler.pending_count(), 1);

        // Pinning keeps the single timer for the note.
        store.toggle_pin(&id).await;
        assert_eq!(scheduler.pending_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_note_stats_include_archive() -> Result<()> {
        let mut store = signed_in_store().await?;
        store.save(NoteDraft::new("Standup").tag("Work").pinned(true)).await;
        store.save(NoteDraft::new("Bread").tag("Shopping")).await;
        store.save(NoteDraft::new("Retro").tag("Work")).await;
        let retro = store.by_tag("Work").iter().find(|n| n.title == "Retro").unwrap().id.clone();
        store.toggle_archive(&retro).await;

        let stats = store.stats(Utc::now()).await;
        assert_eq!(
            stats,
            NoteStats {
                total: 3,
                pinned: 1,
                archived: 1,
                active: 2,
                this_week: 3,
                unique_tags: 2,
            }
        );
        assert_eq!(store.stats(Utc::now() + Duration::days(8)).await.this_week, 0);
        Ok(())
    }
}
