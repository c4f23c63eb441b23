//! View models - the shapes the presentation layer works with.
//!
//! These are the denormalized, typed counterparts of the rows in
//! [`crate::entities`]. They serialize as camelCase JSON. Drafts are partial
//! view models: a `None` field means "not provided" and is never written.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A note as shown in the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Opaque identity
    pub id: String,
    /// Note title, never empty
    pub title: String,
    /// Body text, may be empty
    pub description: String,
    /// Name of the tag this note is filed under
    pub tag: String,
    /// Tag color at the time the note was last saved
    pub tag_color: String,
    /// Pinned notes sort first
    pub is_pinned: bool,
    /// Archived notes are kept out of the main list
    pub is_archived: bool,
    /// Optional reminder instant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<DateTime<Utc>>,
    /// Creation instant
    pub created_at: DateTime<Utc>,
    /// Last save instant, never earlier than `created_at`
    pub updated_at: DateTime<Utc>,
    /// Ordered checklist
    pub checklist: Vec<ChecklistItem>,
}

impl Note {
    /// True when the note has a checklist and every item is done.
    #[must_use]
    pub fn is_checklist_complete(&self) -> bool {
        !self.checklist.is_empty() && self.checklist.iter().all(|item| item.is_done)
    }
}

/// One line of a note's checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    /// Identity within the owning note
    pub id: String,
    /// Item text
    pub title: String,
    /// Whether the item is ticked off
    pub is_done: bool,
}

impl ChecklistItem {
    /// Creates an unticked item with a fresh id.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            is_done: false,
        }
    }
}

/// How often a payment comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    /// A one-off payment
    #[default]
    Once,
    /// Due every month
    Monthly,
    /// Due every year
    Yearly,
}

impl Recurrence {
    /// Code stored in the `frequency` column.
    #[must_use]
    pub const fn as_code(self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older rows were written with the Turkish codes.
        match s.trim().to_lowercase().as_str() {
            "once" | "tek_sefer" => Ok(Self::Once),
            "monthly" | "aylık" => Ok(Self::Monthly),
            "yearly" | "yıllık" => Ok(Self::Yearly),
            _ => Err(format!("Invalid recurrence: {s}")),
        }
    }
}

/// A bill or other payment with a due date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Opaque identity
    pub id: String,
    /// What is being paid
    pub title: String,
    /// Non-negative amount, currency agnostic
    pub amount: Decimal,
    /// When the payment is due
    pub due_date: DateTime<Utc>,
    /// Whether it has been paid
    pub is_paid: bool,
    /// How often it recurs
    pub recurrence: Recurrence,
    /// Optional reminder instant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<DateTime<Utc>>,
    /// Free-form notes
    pub notes: String,
    /// Spending category
    pub category: String,
    /// Whether its reminder has already been shown
    #[serde(default)]
    pub notified: bool,
}

impl Payment {
    /// Unpaid and past its due date.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_paid && self.due_date < now
    }
}

/// A named color label for notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique within a user's tag set
    pub name: String,
    /// Hex color
    pub color: String,
}

impl Tag {
    /// Creates a tag.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Partial note used for create (no `id`) and update (with `id`).
///
/// `reminder_time` is doubly optional: `Some(None)` clears a stored reminder,
/// `None` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    /// Note to update; `None` creates a new one
    pub id: Option<String>,
    /// New title, must not be blank
    pub title: Option<String>,
    /// New body text
    pub description: Option<String>,
    /// Tag name to file the note under
    pub tag: Option<String>,
    /// Tag color stored with the note
    pub tag_color: Option<String>,
    /// Pinned flag
    pub is_pinned: Option<bool>,
    /// Reminder to set (`Some(Some(_))`) or clear (`Some(None)`)
    pub reminder_time: Option<Option<DateTime<Utc>>>,
    /// Replacement checklist
    pub checklist: Option<Vec<ChecklistItem>>,
}

impl NoteDraft {
    /// Draft for a brand new note.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Draft that updates the note with `id`.
    #[must_use]
    pub fn edit(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the body text.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Files the note under `tag`. The color is filled from the tag set when
    /// saved through [`crate::dashboard::Dashboard::save_note`].
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the tag color explicitly.
    #[must_use]
    pub fn tag_color(mut self, color: impl Into<String>) -> Self {
        self.tag_color = Some(color.into());
        self
    }

    /// Pins or unpins the note.
    #[must_use]
    pub fn pinned(mut self, is_pinned: bool) -> Self {
        self.is_pinned = Some(is_pinned);
        self
    }

    /// Sets a reminder at `at`.
    #[must_use]
    pub fn remind_at(mut self, at: DateTime<Utc>) -> Self {
        self.reminder_time = Some(Some(at));
        self
    }

    /// Removes the stored reminder.
    #[must_use]
    pub fn clear_reminder(mut self) -> Self {
        self.reminder_time = Some(None);
        self
    }

    /// Replaces the checklist.
    #[must_use]
    pub fn checklist(mut self, items: Vec<ChecklistItem>) -> Self {
        self.checklist = Some(items);
        self
    }
}

impl From<&Note> for NoteDraft {
    fn from(note: &Note) -> Self {
        Self {
            id: Some(note.id.clone()),
            title: Some(note.title.clone()),
            description: Some(note.description.clone()),
            tag: Some(note.tag.clone()),
            tag_color: Some(note.tag_color.clone()),
            is_pinned: Some(note.is_pinned),
            reminder_time: Some(note.reminder_time),
            checklist: Some(note.checklist.clone()),
        }
    }
}

/// Partial payment used for create (no `id`) and update (with `id`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentDraft {
    /// Payment to update; `None` creates a new one
    pub id: Option<String>,
    /// New title, must not be blank
    pub title: Option<String>,
    /// New amount, must not be negative
    pub amount: Option<Decimal>,
    /// New due date
    pub due_date: Option<DateTime<Utc>>,
    /// Paid flag
    pub is_paid: Option<bool>,
    /// New recurrence
    pub recurrence: Option<Recurrence>,
    /// Reminder to set (`Some(Some(_))`) or clear (`Some(None)`)
    pub reminder_time: Option<Option<DateTime<Utc>>>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Spending category
    pub category: Option<String>,
}

impl PaymentDraft {
    /// Draft for a brand new payment.
    #[must_use]
    pub fn new(title: impl Into<String>, amount: Decimal, due_date: DateTime<Utc>) -> Self {
        Self {
            title: Some(title.into()),
            amount: Some(amount),
            due_date: Some(due_date),
            ..Self::default()
        }
    }

    /// Draft that updates the payment with `id`.
    #[must_use]
    pub fn edit(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the amount.
    #[must_use]
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Moves the due date.
    #[must_use]
    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Marks the payment paid or unpaid.
    #[must_use]
    pub fn paid(mut self, is_paid: bool) -> Self {
        self.is_paid = Some(is_paid);
        self
    }

    /// Sets how often the payment recurs.
    #[must_use]
    pub fn recurring(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Sets a reminder at `at`.
    #[must_use]
    pub fn remind_at(mut self, at: DateTime<Utc>) -> Self {
        self.reminder_time = Some(Some(at));
        self
    }

    /// Sets the free-form notes.
    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Files the payment under `category`.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

impl From<&Payment> for PaymentDraft {
    fn from(payment: &Payment) -> Self {
        Self {
            id: Some(payment.id.clone()),
            title: Some(payment.title.clone()),
            amount: Some(payment.amount),
            due_date: Some(payment.due_date),
            is_paid: Some(payment.is_paid),
            recurrence: Some(payment.recurrence),
            reminder_time: Some(payment.reminder_time),
            notes: Some(payment.notes.clone()),
            category: Some(payment.category.clone()),
        }
    }
}

/// Partial tag. A tag is keyed by name, so an update names the tag it edits
/// in `rename_from`; `name` then carries the new name, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDraft {
    /// Current name of the tag to edit; `None` creates a new one
    pub rename_from: Option<String>,
    /// New name
    pub name: Option<String>,
    /// New hex color
    pub color: Option<String>,
}

impl TagDraft {
    /// Draft for a new tag.
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            rename_from: None,
            name: Some(name.into()),
            color: Some(color.into()),
        }
    }

    /// Draft that edits the tag currently called `name`.
    #[must_use]
    pub fn edit(name: impl Into<String>) -> Self {
        Self {
            rename_from: Some(name.into()),
            ..Self::default()
        }
    }

    /// Renames the tag to `name`.
    #[must_use]
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the color.
    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}
