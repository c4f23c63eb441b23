//! Tag remote operations - table-scoped CRUD over `tags`.
//!
//! Tags are keyed by name within a user's set. Renaming or deleting a tag does
//! not touch notes that reference the old name; those notes keep the name and
//! the color they were saved with.

use crate::{
    core::mapper,
    entities::{TagEntity, tag},
    errors::{Error, Result},
    models::{Tag, TagDraft},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const KIND: &str = "Tag";

/// Tags seeded for a user whose tag set is empty.
#[must_use]
pub fn default_tags() -> Vec<Tag> {
    vec![
        Tag::new("Work", "#3B82F6"),
        Tag::new("Personal", "#10B981"),
        Tag::new("Important", "#F59E0B"),
        Tag::new("Idea", "#8B5CF6"),
        Tag::new("Shopping", "#EF4444"),
    ]
}

/// Retrieves the user's tags in creation order.
#[instrument(skip(db))]
pub async fn fetch_tags(db: &DatabaseConnection, user_id: &str) -> Result<Vec<Tag>> {
    let tags = TagEntity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .order_by_asc(tag::Column::CreatedAt)
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(mapper::tag_to_view)
        .collect::<Vec<_>>();
    debug!("Fetched {} tags", tags.len());
    Ok(tags)
}

async fn find_by_name(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
) -> Result<Option<tag::Model>> {
    TagEntity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .filter(tag::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a tag. The name must be non-blank and not already in use.
#[instrument(skip(db, draft))]
pub async fn create_tag(db: &DatabaseConnection, user_id: &str, draft: &TagDraft) -> Result<Tag> {
    let name = draft.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(Error::validation("Tag name cannot be empty"));
    }
    if find_by_name(db, user_id, name).await?.is_some() {
        return Err(Error::validation(format!("Tag '{name}' already exists")));
    }

    let id = Uuid::new_v4().to_string();
    let record = mapper::new_tag_record(draft, user_id, id, Utc::now())
        .insert(db)
        .await?;
    Ok(mapper::tag_to_view(record))
}

/// Updates the tag currently named `name`: renames it and/or changes its color.
#[instrument(skip(db, draft))]
pub async fn update_tag(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
    draft: &TagDraft,
) -> Result<Tag> {
    let existing = find_by_name(db, user_id, name)
        .await?
        .ok_or_else(|| Error::NotFound {
            kind: KIND,
            key: name.to_string(),
        })?;

    if let Some(new_name) = draft.name.as_deref().map(str::trim) {
        if new_name.is_empty() {
            return Err(Error::validation("Tag name cannot be empty"));
        }
        if new_name != name && find_by_name(db, user_id, new_name).await?.is_some() {
            return Err(Error::validation(format!("Tag '{new_name}' already exists")));
        }
    }

    let mut changes = mapper::tag_changes(draft);
    changes.updated_at = Set(Utc::now());
    TagEntity::update_many()
        .set(changes)
        .filter(tag::Column::Id.eq(existing.id.clone()))
        .filter(tag::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    TagEntity::find_by_id(existing.id)
        .one(db)
        .await?
        .map(mapper::tag_to_view)
        .ok_or_else(|| Error::NotFound {
            kind: KIND,
            key: name.to_string(),
        })
}

/// Deletes the tag named `name`. Notes filed under it keep the name.
#[instrument(skip(db))]
pub async fn delete_tag(db: &DatabaseConnection, user_id: &str, name: &str) -> Result<()> {
    let result = TagEntity::delete_many()
        .filter(tag::Column::UserId.eq(user_id))
        .filter(tag::Column::Name.eq(name))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            kind: KIND,
            key: name.to_string(),
        });
    }
    Ok(())
}

/// Inserts `defaults` for a user who has no tags yet.
#[instrument(skip(db, defaults))]
pub async fn seed_tags(db: &DatabaseConnection, user_id: &str, defaults: &[Tag]) -> Result<()> {
    info!("Seeding {} default tags", defaults.len());
    for tag in defaults {
        if find_by_name(db, user_id, &tag.name).await?.is_some() {
            continue;
        }
        create_tag(db, user_id, &TagDraft::new(tag.name.clone(), tag.color.clone())).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_tag_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_tag(&db, TEST_USER, &TagDraft::new("  ", "#000000")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        create_tag(&db, TEST_USER, &TagDraft::new("Work", "#3B82F6")).await?;
        let result = create_tag(&db, TEST_USER, &TagDraft::new("Work", "#000000")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        // Another user may reuse the name.
        create_tag(&db, OTHER_USER, &TagDraft::new("Work", "#000000")).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_tags_in_order() -> Result<()> {
        let db = setup_test_db().await?;
        seed_tags(&db, TEST_USER, &default_tags()).await?;

        let names: Vec<String> = fetch_tags(&db, TEST_USER)
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"Shopping".to_string()));

        // Seeding again adds nothing.
        seed_tags(&db, TEST_USER, &default_tags()).await?;
        assert_eq!(fetch_tags(&db, TEST_USER).await?.len(), 5);

        Ok(())
    }

    #[tokio::test]
    async fn test_rename_and_recolor_tag() -> Result<()> {
        let db = setup_test_db().await?;
        create_tag(&db, TEST_USER, &TagDraft::new("Work", "#3B82F6")).await?;

        let updated = update_tag(
            &db,
            TEST_USER,
            "Work",
            &TagDraft::edit("Work").rename("Office").color("#111111"),
        )
        .await?;
        assert_eq!(updated, Tag::new("Office", "#111111"));

        let result = update_tag(&db, TEST_USER, "Work", &TagDraft::edit("Work")).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_rename_to_existing_name_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_tag(&db, TEST_USER, &TagDraft::new("Work", "#3B82F6")).await?;
        create_tag(&db, TEST_USER, &TagDraft::new("Home", "#6B7280")).await?;

        let result =
            update_tag(&db, TEST_USER, "Home", &TagDraft::edit("Home").rename("Work")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_tag() -> Result<()> {
        let db = setup_test_db().await?;
        create_tag(&db, TEST_USER, &TagDraft::new("Temp", "#000000")).await?;

        delete_tag(&db, TEST_USER, "Temp").await?;
        assert!(fetch_tags(&db, TEST_USER).await?.is_empty());

        let result = delete_tag(&db, TEST_USER, "Temp").await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }
}
