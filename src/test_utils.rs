//! Shared test utilities for `CapNote`.
//!
//! Helpers for setting up an in-memory database, creating entities with
//! sensible defaults, and a notifier that records what it would have shown.

use crate::{
    core::{notes, payments},
    errors::Result,
    models::{Note, NoteDraft, Payment, PaymentDraft},
    notify::{NotificationPayload, Notifier, Permission},
    session::Session,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Owner of most test rows.
pub const TEST_USER: &str = "user-test";
/// A second user, for isolation checks.
pub const OTHER_USER: &str = "user-other";

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Session for [`TEST_USER`].
pub fn test_session() -> Session {
    Session::new(TEST_USER).with_email("test@example.com")
}

/// Drops `table` so every later query against it fails.
pub async fn break_table(db: &DatabaseConnection, table: &str) -> Result<()> {
    db.execute_unprepared(&format!("DROP TABLE {table}")).await?;
    Ok(())
}

/// Creates a note with only a title.
///
/// # Defaults
/// * tag: "General" / "#3B82F6"
/// * unpinned, no reminder, empty checklist
pub async fn create_test_note(db: &DatabaseConnection, user_id: &str, title: &str) -> Result<Note> {
    notes::create_note(db, user_id, &NoteDraft::new(title)).await
}

/// Creates an unpaid one-off payment of 100.00.
pub async fn create_test_payment(
    db: &DatabaseConnection,
    user_id: &str,
    title: &str,
    due_date: DateTime<Utc>,
) -> Result<Payment> {
    let draft = PaymentDraft::new(title, Decimal::new(10000, 2), due_date);
    payments::create_payment(db, user_id, &draft).await
}

/// Notifier that keeps every shown payload in memory.
#[derive(Debug)]
pub struct RecordingNotifier {
    permission: Mutex<Permission>,
    answer: Permission,
    prompts: AtomicUsize,
    shown: Mutex<Vec<NotificationPayload>>,
}

impl RecordingNotifier {
    fn with(permission: Permission, answer: Permission) -> Self {
        Self {
            permission: Mutex::new(permission),
            answer,
            prompts: AtomicUsize::new(0),
            shown: Mutex::new(Vec::new()),
        }
    }

    /// Permission already granted.
    pub fn granted() -> Self {
        Self::with(Permission::Granted, Permission::Granted)
    }

    /// Permission already denied.
    pub fn denied() -> Self {
        Self::with(Permission::Denied, Permission::Denied)
    }

    /// Not asked yet; the prompt answers `answer`.
    pub fn prompting(answer: Permission) -> Self {
        Self::with(Permission::Default, answer)
    }

    pub fn shown(&self) -> Vec<NotificationPayload> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> Permission {
        self.permission.lock().map_or(Permission::Denied, |p| *p)
    }

    fn request_permission(&self) -> Permission {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut permission) = self.permission.lock() {
            *permission = self.answer;
        }
        self.answer
    }

    fn show(&self, payload: &NotificationPayload) -> Result<()> {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push(payload.clone());
        }
        Ok(())
    }
}
