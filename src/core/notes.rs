//! Note remote operations - table-scoped CRUD over `notes`.
//!
//! Every query is filtered by the owning `user_id`, so a caller can never read
//! or touch another user's rows even with a valid note id. Functions return
//! view models already mapped through [`crate::core::mapper`].

use crate::{
    core::mapper,
    entities::{NoteEntity, note},
    errors::{Error, Result},
    models::{Note, NoteDraft},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::{debug, instrument};
use uuid::Uuid;

const KIND: &str = "Note";

/// Orders notes the way the dashboard lists them: pinned first, then most
/// recently updated.
pub fn sort_for_display(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
}

async fn fetch_by_archived(
    db: &DatabaseConnection,
    user_id: &str,
    archived: bool,
) -> Result<Vec<Note>> {
    let mut notes: Vec<Note> = NoteEntity::find()
        .filter(note::Column::UserId.eq(user_id))
        .filter(note::Column::IsArchived.eq(archived))
        .all(db)
        .await?
        .into_iter()
        .map(mapper::note_to_view)
        .collect();
    sort_for_display(&mut notes);
    Ok(notes)
}

/// Retrieves the user's active (non-archived) notes.
#[instrument(skip(db))]
pub async fn fetch_notes(db: &DatabaseConnection, user_id: &str) -> Result<Vec<Note>> {
    let notes = fetch_by_archived(db, user_id, false).await?;
    debug!("Fetched {} notes", notes.len());
    Ok(notes)
}

/// Retrieves the user's archived notes, most recently updated first.
#[instrument(skip(db))]
pub async fn fetch_archived_notes(db: &DatabaseConnection, user_id: &str) -> Result<Vec<Note>> {
    fetch_by_archived(db, user_id, true).await
}

async fn find_record(db: &DatabaseConnection, user_id: &str, id: &str) -> Result<note::Model> {
    NoteEntity::find_by_id(id.to_string())
        .filter(note::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            kind: KIND,
            key: id.to_string(),
        })
}

/// Finds one note by id, returning None if it does not exist or belongs to
/// someone else.
pub async fn get_note(db: &DatabaseConnection, user_id: &str, id: &str) -> Result<Option<Note>> {
    match find_record(db, user_id, id).await {
        Ok(record) => Ok(Some(mapper::note_to_view(record))),
        Err(Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Creates a note. The title must contain something other than whitespace.
#[instrument(skip(db, draft))]
pub async fn create_note(db: &DatabaseConnection, user_id: &str, draft: &NoteDraft) -> Result<Note> {
    let has_title = draft.title.as_deref().is_some_and(|t| !t.trim().is_empty());
    if !has_title {
        return Err(Error::validation("Note title cannot be empty"));
    }

    let id = Uuid::new_v4().to_string();
    let record = mapper::new_note_record(draft, user_id, id, Utc::now())
        .insert(db)
        .await?;
    debug!("Created note {}", record.id);
    Ok(mapper::note_to_view(record))
}

/// Updates the columns the draft carries on the note with `id` and bumps
/// `updated_at`.
#[instrument(skip(db, draft))]
pub async fn update_note(
    db: &DatabaseConnection,
    user_id: &str,
    id: &str,
    draft: &NoteDraft,
) -> Result<Note> {
    if draft.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(Error::validation("Note title cannot be empty"));
    }

    let existing = find_record(db, user_id, id).await?;
    let mut changes = mapper::note_changes(draft);
    changes.updated_at = Set(Utc::now().max(existing.created_at));

    let result = NoteEntity::update_many()
        .set(changes)
        .filter(note::Column::Id.eq(id))
        .filter(note::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            kind: KIND,
            key: id.to_string(),
        });
    }

    find_record(db, user_id, id).await.map(mapper::note_to_view)
}

/// Deletes the note with `id`.
#[instrument(skip(db))]
pub async fn delete_note(db: &DatabaseConnection, user_id: &str, id: &str) -> Result<()> {
    let result = NoteEntity::delete_many()
        .filter(note::Column::Id.eq(id))
        .filter(note::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            kind: KIND,
            key: id.to_string(),
        });
    }
    Ok(())
}

/// Flips `is_pinned` and nothing else; `updated_at` is left untouched so a
/// pin never reorders notes by recency. Returns the new pin state.
#[instrument(skip(db))]
pub async fn toggle_pin(db: &DatabaseConnection, user_id: &str, id: &str) -> Result<bool> {
    let existing = find_record(db, user_id, id).await?;
    let pinned = !existing.is_pinned;

    let changes = note::ActiveModel {
        is_pinned: Set(pinned),
        ..Default::default()
    };
    NoteEntity::update_many()
        .set(changes)
        .filter(note::Column::Id.eq(id))
        .filter(note::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(pinned)
}

/// Flips `is_archived`. Returns the new archive state.
#[instrument(skip(db))]
pub async fn toggle_archive(db: &DatabaseConnection, user_id: &str, id: &str) -> Result<bool> {
    let existing = find_record(db, user_id, id).await?;
    let archived = !existing.is_archived;

    let changes = note::ActiveModel {
        is_archived: Set(archived),
        updated_at: Set(Utc::now().max(existing.created_at)),
        ..Default::default()
    };
    NoteEntity::update_many()
        .set(changes)
        .filter(note::Column::Id.eq(id))
        .filter(note::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(archived)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::models::ChecklistItem;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_create_note_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_note(&db, TEST_USER, &NoteDraft::default()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        let result = create_note(&db, TEST_USER, &NoteDraft::new("   ")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_fetch_note_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let draft = NoteDraft::new("Groceries")
            .description("Milk, eggs")
            .tag("Shopping")
            .tag_color("#EF4444")
            .checklist(vec![ChecklistItem::new("milk")]);
        let created = create_note(&db, TEST_USER, &draft).await?;

        let notes = fetch_notes(&db, TEST_USER).await?;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0], created);
        assert_eq!(notes[0].title, "Groceries");
        assert_eq!(notes[0].description, "Milk, eggs");
        assert_eq!(notes[0].tag, "Shopping");
        assert_eq!(notes[0].checklist.len(), 1);
        assert!(!notes[0].is_pinned);
        assert_eq!(notes[0].reminder_time, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_notes_are_scoped_to_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let note = create_test_note(&db, TEST_USER, "Mine").await?;
        create_test_note(&db, OTHER_USER, "Theirs").await?;

        let notes = fetch_notes(&db, TEST_USER).await?;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Mine");

        assert!(get_note(&db, OTHER_USER, &note.id).await?.is_none());
        let result = delete_note(&db, OTHER_USER, &note.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        assert!(get_note(&db, TEST_USER, &note.id).await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_note_only_touches_provided_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let draft = NoteDraft::new("Plan trip").description("Book hotel").tag("Personal");
        let created = create_note(&db, TEST_USER, &draft).await?;

        let updated = update_note(
            &db,
            TEST_USER,
            &created.id,
            &NoteDraft::edit(created.id.clone()).title("Plan summer trip"),
        )
        .await?;

        assert_eq!(updated.title, "Plan summer trip");
        assert_eq!(updated.description, "Book hotel");
        assert_eq!(updated.tag, "Personal");
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_note() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_note(&db, TEST_USER, "missing", &NoteDraft::edit("missing")).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_pin_leaves_other_fields_alone() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_note(&db, TEST_USER, "Pin me").await?;

        assert!(toggle_pin(&db, TEST_USER, &created.id).await?);
        let pinned = get_note(&db, TEST_USER, &created.id).await?.unwrap();

        assert!(pinned.is_pinned);
        assert_eq!(
            Note {
                is_pinned: false,
                ..pinned
            },
            created
        );

        assert!(!toggle_pin(&db, TEST_USER, &created.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_archived_notes_leave_main_list() -> Result<()> {
        let db = setup_test_db().await?;
        let note = create_test_note(&db, TEST_USER, "Old idea").await?;

        assert!(toggle_archive(&db, TEST_USER, &note.id).await?);
        assert!(fetch_notes(&db, TEST_USER).await?.is_empty());

        let archived = fetch_archived_notes(&db, TEST_USER).await?;
        assert_eq!(archived.len(), 1);
        assert!(archived[0].is_archived);

        Ok(())
    }

    #[tokio::test]
    async fn test_pinned_notes_sort_first() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_note(&db, TEST_USER, "First").await?;
        let second = create_test_note(&db, TEST_USER, "Second").await?;
        toggle_pin(&db, TEST_USER, &first.id).await?;

        let notes = fetch_notes(&db, TEST_USER).await?;
        assert_eq!(notes[0].id, first.id);
        assert_eq!(notes[1].id, second.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = delete_note(&db, TEST_USER, "gone").await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
