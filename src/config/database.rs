//! Database configuration module for `CapNote`.
//!
//! This module handles the remote store connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. Production points `DATABASE_URL` at the hosted Postgres instance;
//! local runs and tests use `SQLite`.

use crate::entities::{NoteEntity, ReminderEntity, TagEntity, tag};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Local store used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/capnote.sqlite?mode=rwc";

/// Gets the database URL from the environment or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Directory holding a file-backed `SQLite` database, if `url` names one.
fn sqlite_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(':') {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Connects to the store named by `DATABASE_URL`, creating the directory of a
/// local `SQLite` file first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    info!("Connecting to {}", database_url.split('?').next().unwrap_or(""));
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the `notes`, `reminders` and `tags` tables, plus the unique
/// `(user_id, name)` index on `tags`. Existing tables are left alone.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let note_table = schema
        .create_table_from_entity(NoteEntity)
        .if_not_exists()
        .to_owned();
    let reminder_table = schema
        .create_table_from_entity(ReminderEntity)
        .if_not_exists()
        .to_owned();
    let tag_table = schema
        .create_table_from_entity(TagEntity)
        .if_not_exists()
        .to_owned();

    db.execute(builder.build(&note_table)).await?;
    db.execute(builder.build(&reminder_table)).await?;
    db.execute(builder.build(&tag_table)).await?;

    let column_indexes = [
        schema.create_index_from_entity(NoteEntity),
        schema.create_index_from_entity(ReminderEntity),
        schema.create_index_from_entity(TagEntity),
    ];
    for mut index in column_indexes.into_iter().flatten() {
        let index = index.if_not_exists().to_owned();
        db.execute(builder.build(&index)).await?;
    }

    let tag_name_index = Index::create()
        .name("idx_tags_user_id_name")
        .table(TagEntity)
        .col(tag::Column::UserId)
        .col(tag::Column::Name)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&tag_name_index)).await?;

    debug!("Tables ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{NoteRecord, ReminderRecord, TagRecord};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<NoteRecord> = NoteEntity::find().limit(1).all(&db).await?;
        let _: Vec<ReminderRecord> = ReminderEntity::find().limit(1).all(&db).await?;
        let _: Vec<TagRecord> = TagEntity::find().limit(1).all(&db).await?;

        // Running twice is harmless.
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_sqlite_dir() {
        assert_eq!(
            sqlite_dir("sqlite://data/capnote.sqlite?mode=rwc"),
            Some(Path::new("data"))
        );
        assert_eq!(sqlite_dir("sqlite://capnote.sqlite"), None);
        assert_eq!(sqlite_dir("sqlite::memory:"), None);
        assert_eq!(sqlite_dir("postgres://localhost/capnote"), None);
    }
}
