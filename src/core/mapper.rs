//! Field mapper - Translates between remote records and view models.
//!
//! Reading (`*_to_view`) never fails: absent or malformed remote values degrade
//! to `None` or to the documented defaults below. Writing (`*_changes`) only
//! sets the columns a draft actually carries; `new_*_record` additionally fills
//! the non-null columns a fresh row needs.

use crate::{
    entities::{note, reminder, tag},
    models::{ChecklistItem, Note, NoteDraft, Payment, PaymentDraft, Recurrence, Tag, TagDraft},
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, Set, Value};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Tag given to notes created without one.
pub const DEFAULT_TAG_NAME: &str = "General";
/// Color stored with [`DEFAULT_TAG_NAME`] and with notes whose tag color is unknown.
pub const DEFAULT_TAG_COLOR: &str = "#3B82F6";
/// Category given to payments created without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Checklist item as stored inside the `notes.checklist` JSON column.
#[derive(Debug, Serialize, Deserialize)]
struct StoredChecklistItem {
    id: String,
    title: String,
    #[serde(default)]
    is_done: bool,
}

/// Parses a remote timestamp. Accepts RFC 3339, Postgres text output
/// (`2025-03-01 09:30:00+00`) and bare dates, which are read as midnight UTC.
#[must_use]
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

/// Formats an instant the way it is written to text columns. Sub-second
/// precision is kept so a write followed by a read is lossless.
#[must_use]
pub fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_optional_instant(raw: Option<&str>, column: &str) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let parsed = parse_instant(raw);
    if parsed.is_none() {
        debug!("Ignoring unparseable {} value {:?}", column, raw);
    }
    parsed
}

fn parse_checklist(raw: &str) -> Vec<ChecklistItem> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<StoredChecklistItem>>(raw) {
        Ok(items) => items
            .into_iter()
            .map(|item| ChecklistItem {
                id: item.id,
                title: item.title,
                is_done: item.is_done,
            })
            .collect(),
        Err(e) => {
            debug!("Ignoring malformed checklist JSON: {}", e);
            Vec::new()
        }
    }
}

fn encode_checklist(items: &[ChecklistItem]) -> String {
    let stored: Vec<StoredChecklistItem> = items
        .iter()
        .map(|item| StoredChecklistItem {
            id: item.id.clone(),
            title: item.title.clone(),
            is_done: item.is_done,
        })
        .collect();
    serde_json::to_string(&stored).unwrap_or_else(|_| "[]".to_string())
}

fn parse_amount(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim()).unwrap_or_else(|e| {
        debug!("Ignoring unparseable amount {:?}: {}", raw, e);
        Decimal::ZERO
    })
}

fn parse_recurrence(code: &str) -> Recurrence {
    code.parse().unwrap_or_else(|e: String| {
        debug!("{}; falling back to once", e);
        Recurrence::Once
    })
}

/// Sets `field` to `default()` unless the draft already provided a value.
fn set_if_absent<V>(field: &mut ActiveValue<V>, default: impl FnOnce() -> V)
where
    V: Into<Value>,
{
    if field.is_not_set() {
        *field = Set(default());
    }
}

/// Maps a `notes` row to a [`Note`].
#[must_use]
pub fn note_to_view(record: note::Model) -> Note {
    let reminder_time = parse_optional_instant(record.reminder_time.as_deref(), "reminder_time");
    let tag = if record.tag.trim().is_empty() {
        DEFAULT_TAG_NAME.to_string()
    } else {
        record.tag
    };
    let tag_color = if record.tag_color.trim().is_empty() {
        DEFAULT_TAG_COLOR.to_string()
    } else {
        record.tag_color
    };

    Note {
        id: record.id,
        title: record.title,
        description: record.content,
        tag,
        tag_color,
        is_pinned: record.is_pinned,
        is_archived: record.is_archived,
        reminder_time,
        created_at: record.created_at,
        updated_at: record.updated_at.max(record.created_at),
        checklist: parse_checklist(&record.checklist),
    }
}

/// Columns a note draft changes. Absent fields stay `NotSet`.
#[must_use]
pub fn note_changes(draft: &NoteDraft) -> note::ActiveModel {
    let mut model = note::ActiveModel::default();
    if let Some(title) = &draft.title {
        model.title = Set(title.clone());
    }
    if let Some(description) = &draft.description {
        model.content = Set(description.clone());
    }
    if let Some(tag) = &draft.tag {
        model.tag = Set(tag.clone());
    }
    if let Some(color) = &draft.tag_color {
        model.tag_color = Set(color.clone());
    }
    if let Some(is_pinned) = draft.is_pinned {
        model.is_pinned = Set(is_pinned);
    }
    if let Some(reminder_time) = draft.reminder_time {
        model.reminder_time = Set(reminder_time.map(format_instant));
    }
    if let Some(checklist) = &draft.checklist {
        model.checklist = Set(encode_checklist(checklist));
    }
    model
}

/// A complete new `notes` row for `user_id`.
#[must_use]
pub fn new_note_record(
    draft: &NoteDraft,
    user_id: &str,
    id: String,
    now: DateTime<Utc>,
) -> note::ActiveModel {
    let mut model = note_changes(draft);
    model.id = Set(id);
    model.user_id = Set(user_id.to_string());
    set_if_absent(&mut model.title, String::new);
    set_if_absent(&mut model.content, String::new);
    set_if_absent(&mut model.tag, || DEFAULT_TAG_NAME.to_string());
    set_if_absent(&mut model.tag_color, || DEFAULT_TAG_COLOR.to_string());
    set_if_absent(&mut model.checklist, || "[]".to_string());
    set_if_absent(&mut model.is_pinned, || false);
    set_if_absent(&mut model.reminder_time, || None);
    model.is_archived = Set(false);
    model.created_at = Set(now);
    model.updated_at = Set(now);
    model
}

/// Maps a `reminders` row to a [`Payment`].
#[must_use]
pub fn payment_to_view(record: reminder::Model) -> Payment {
    let due_date = parse_instant(&record.due_date).unwrap_or_else(|| {
        debug!(
            "Unparseable due_date {:?} on {}; using created_at",
            record.due_date, record.id
        );
        record.created_at
    });
    let reminder_time = parse_optional_instant(record.reminder_time.as_deref(), "reminder_time");

    Payment {
        amount: parse_amount(&record.amount),
        recurrence: parse_recurrence(&record.frequency),
        id: record.id,
        title: record.title,
        due_date,
        is_paid: record.is_paid,
        reminder_time,
        notes: record.notes,
        category: record.category,
        notified: record.notified,
    }
}

/// Columns a payment draft changes. Absent fields stay `NotSet`.
#[must_use]
pub fn payment_changes(draft: &PaymentDraft) -> reminder::ActiveModel {
    let mut model = reminder::ActiveModel::default();
    if let Some(title) = &draft.title {
        model.title = Set(title.clone());
    }
    if let Some(amount) = draft.amount {
        model.amount = Set(amount.to_string());
    }
    if let Some(due_date) = draft.due_date {
        model.due_date = Set(format_instant(due_date));
    }
    if let Some(is_paid) = draft.is_paid {
        model.is_paid = Set(is_paid);
    }
    if let Some(recurrence) = draft.recurrence {
        model.frequency = Set(recurrence.as_code().to_string());
    }
    if let Some(reminder_time) = draft.reminder_time {
        model.reminder_time = Set(reminder_time.map(format_instant));
    }
    if let Some(notes) = &draft.notes {
        model.notes = Set(notes.clone());
    }
    if let Some(category) = &draft.category {
        model.category = Set(category.clone());
    }
    model
}

/// A complete new `reminders` row for `user_id`. A missing due date defaults
/// to `now`.
#[must_use]
pub fn new_payment_record(
    draft: &PaymentDraft,
    user_id: &str,
    id: String,
    now: DateTime<Utc>,
) -> reminder::ActiveModel {
    let mut model = payment_changes(draft);
    model.id = Set(id);
    model.user_id = Set(user_id.to_string());
    set_if_absent(&mut model.title, String::new);
    set_if_absent(&mut model.amount, || Decimal::ZERO.to_string());
    set_if_absent(&mut model.due_date, || format_instant(now));
    set_if_absent(&mut model.frequency, || Recurrence::Once.as_code().to_string());
    set_if_absent(&mut model.is_paid, || false);
    set_if_absent(&mut model.reminder_time, || None);
    set_if_absent(&mut model.notes, String::new);
    set_if_absent(&mut model.category, || DEFAULT_CATEGORY.to_string());
    model.notified = Set(false);
    model.created_at = Set(now);
    model.updated_at = Set(now);
    model
}

/// Maps a `tags` row to a [`Tag`].
#[must_use]
pub fn tag_to_view(record: tag::Model) -> Tag {
    Tag {
        name: record.name,
        color: record.color,
    }
}

/// Columns a tag draft changes. `rename_from` is the key, not a column.
#[must_use]
pub fn tag_changes(draft: &TagDraft) -> tag::ActiveModel {
    let mut model = tag::ActiveModel::default();
    if let Some(name) = &draft.name {
        model.name = Set(name.trim().to_string());
    }
    if let Some(color) = &draft.color {
        model.color = Set(color.clone());
    }
    model
}

/// A complete new `tags` row for `user_id`.
#[must_use]
pub fn new_tag_record(
    draft: &TagDraft,
    user_id: &str,
    id: String,
    now: DateTime<Utc>,
) -> tag::ActiveModel {
    let mut model = tag_changes(draft);
    model.id = Set(id);
    model.user_id = Set(user_id.to_string());
    set_if_absent(&mut model.name, String::new);
    set_if_absent(&mut model.color, || DEFAULT_TAG_COLOR.to_string());
    model.created_at = Set(now);
    model.updated_at = Set(now);
    model
}
