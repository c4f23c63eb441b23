use super::{EntityStore, SyncKind};
use crate::{
    core::tags,
    errors::Result,
    models::{Tag, TagDraft},
};
use sea_orm::DatabaseConnection;
use tracing::info;

/// Tag kind. Holds the tags seeded for a user with an empty tag set.
#[derive(Debug, Clone)]
pub struct Tags {
    defaults: Vec<Tag>,
}

/// Tags of the signed-in user in creation order.
pub type TagsStore = EntityStore<Tags>;

impl Tags {
    #[must_use]
    pub const fn new(defaults: Vec<Tag>) -> Self {
        Self { defaults }
    }
}

impl Default for Tags {
    fn default() -> Self {
        Self::new(tags::default_tags())
    }
}

impl SyncKind for Tags {
    type View = Tag;
    type Draft = TagDraft;

    const LABEL: &'static str = "tag";

    fn draft_key(draft: &TagDraft) -> Option<&str> {
        draft.rename_from.as_deref()
    }

    fn key_of(tag: &Tag) -> &str {
        &tag.name
    }

    async fn on_session_start(&self, db: &DatabaseConnection, user_id: &str) -> Result<()> {
        if self.defaults.is_empty() || !tags::fetch_tags(db, user_id).await?.is_empty() {
            return Ok(());
        }
        info!("No tags yet; seeding defaults");
        tags::seed_tags(db, user_id, &self.defaults).await
    }

    async fn fetch(&self, db: &DatabaseConnection, user_id: &str) -> Result<Vec<Tag>> {
        tags::fetch_tags(db, user_id).await
    }

    async fn create(&self, db: &DatabaseConnection, user_id: &str, draft: &TagDraft) -> Result<Tag> {
        tags::create_tag(db, user_id, draft).await
    }

    async fn update(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
        key: &str,
        draft: &TagDraft,
    ) -> Result<Tag> {
        tags::update_tag(db, user_id, key, draft).await
    }

    async fn delete(&self, db: &DatabaseConnection, user_id: &str, key: &str) -> Result<()> {
        tags::delete_tag(db, user_id, key).await
    }
}

impl EntityStore<Tags> {
    /// Color of the tag called `name`, if the user has one.
    #[must_use]
    pub fn color_of(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.color.as_str())
    }
}
