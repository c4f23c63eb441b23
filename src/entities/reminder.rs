//! Reminder entity - Represents a row of the `reminders` table.
//!
//! The remote service calls payments "reminders". Amounts are kept as decimal
//! text so no floating point ever touches a stored amount, and dates are text
//! because older rows hold bare `YYYY-MM-DD` due dates.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment reminder database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reminders")]
pub struct Model {
    /// UUID v4 generated client-side on insert
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning user; every query filters on it
    #[sea_orm(indexed)]
    pub user_id: String,
    /// What is being paid (e.g., "Electricity", "Rent")
    pub title: String,
    /// Decimal amount as text (e.g., `"245.50"`)
    pub amount: String,
    /// Due date, RFC 3339 or `YYYY-MM-DD`
    pub due_date: String,
    /// Recurrence code: `"once"`, `"monthly"` or `"yearly"`
    pub frequency: String,
    /// Whether the bill has been paid
    pub is_paid: bool,
    /// Whether a reminder has already been shown for this row
    pub notified: bool,
    /// Optional reminder instant (RFC 3339)
    pub reminder_time: Option<String>,
    /// Spending category
    pub category: String,
    /// Free-form notes
    pub notes: String,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// When the row was last saved
    pub updated_at: DateTimeUtc,
}

/// `Reminder` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
