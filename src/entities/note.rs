//! Note entity - Represents a row of the `notes` table.
//!
//! Notes carry their tag by name plus a denormalized copy of the tag color.
//! The checklist is stored inline as a JSON array and reminder instants are
//! stored as RFC 3339 text, exactly as the remote service hands them out.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Note database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notes")]
pub struct Model {
    /// UUID v4 generated client-side on insert
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning user; every query filters on it
    #[sea_orm(indexed)]
    pub user_id: String,
    /// Note title, never empty
    pub title: String,
    /// Free-form body text
    pub content: String,
    /// Name of the tag this note is filed under
    pub tag: String,
    /// Hex color copied from the tag when the note was last saved
    pub tag_color: String,
    /// Checklist items as a JSON array of `{id, title, is_done}`
    #[sea_orm(column_type = "Text")]
    pub checklist: String,
    /// Pinned notes sort first
    pub is_pinned: bool,
    /// Archived notes are hidden from the main list
    pub is_archived: bool,
    /// Optional reminder instant (RFC 3339)
    pub reminder_time: Option<String>,
    /// When the note was created
    pub created_at: DateTimeUtc,
    /// When the note was last saved
    pub updated_at: DateTimeUtc,
}

/// Notes have no relations; `tag` is a plain name reference
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
