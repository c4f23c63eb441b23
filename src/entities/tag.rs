//! Tag entity - Represents a row of the `tags` table.
//! A tag name is unique per user (enforced by a composite index).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tag database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    /// UUID v4 generated client-side on insert
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Tag name, the key notes refer to
    pub name: String,
    /// Hex color (e.g., `"#3B82F6"`)
    pub color: String,
    /// When the tag was created
    pub created_at: DateTimeUtc,
    /// When the tag was last modified
    pub updated_at: DateTimeUtc,
}

/// `Tag` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
