//! Payment remote operations - table-scoped CRUD over `reminders`.
//!
//! The remote service stores payments in the `reminders` table. Amounts are
//! validated here (non-negative) before any write reaches the store.

use crate::{
    core::mapper,
    entities::{ReminderEntity, reminder},
    errors::{Error, Result},
    models::{Payment, PaymentDraft},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{Set, prelude::*};
use tracing::{debug, instrument};
use uuid::Uuid;

const KIND: &str = "Payment";

fn validate(draft: &PaymentDraft) -> Result<()> {
    if let Some(amount) = draft.amount {
        if amount < Decimal::ZERO {
            return Err(Error::InvalidAmount { amount });
        }
    }
    if draft.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(Error::validation("Payment title cannot be empty"));
    }
    Ok(())
}

/// Retrieves all of the user's payments, earliest due date first.
#[instrument(skip(db))]
pub async fn fetch_payments(db: &DatabaseConnection, user_id: &str) -> Result<Vec<Payment>> {
    let mut payments: Vec<Payment> = ReminderEntity::find()
        .filter(reminder::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(mapper::payment_to_view)
        .collect();
    // Sorted after mapping: due dates are text and legacy rows hold bare dates.
    payments.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    debug!("Fetched {} payments", payments.len());
    Ok(payments)
}

async fn find_record(
    db: &DatabaseConnection,
    user_id: &str,
    id: &str,
) -> Result<reminder::Model> {
    ReminderEntity::find_by_id(id.to_string())
        .filter(reminder::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            kind: KIND,
            key: id.to_string(),
        })
}

/// Finds one payment by id, returning None if it does not exist or belongs
/// to someone else.
pub async fn get_payment(
    db: &DatabaseConnection,
    user_id: &str,
    id: &str,
) -> Result<Option<Payment>> {
    match find_record(db, user_id, id).await {
        Ok(record) => Ok(Some(mapper::payment_to_view(record))),
        Err(Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Creates a payment. Title is required; amount must not be negative.
#[instrument(skip(db, draft))]
pub async fn create_payment(
    db: &DatabaseConnection,
    user_id: &str,
    draft: &PaymentDraft,
) -> Result<Payment> {
    if draft.title.is_none() {
        return Err(Error::validation("Payment title cannot be empty"));
    }
    validate(draft)?;

    let id = Uuid::new_v4().to_string();
    let record = mapper::new_payment_record(draft, user_id, id, Utc::now())
        .insert(db)
        .await?;
    debug!("Created payment {}", record.id);
    Ok(mapper::payment_to_view(record))
}

/// Updates the columns the draft carries on the payment with `id`.
#[instrument(skip(db, draft))]
pub async fn update_payment(
    db: &DatabaseConnection,
    user_id: &str,
    id: &str,
    draft: &PaymentDraft,
) -> Result<Payment> {
    validate(draft)?;

    let mut changes = mapper::payment_changes(draft);
    changes.updated_at = Set(Utc::now());
    // A new due date or reminder means the reminder has not been shown yet.
    if draft.due_date.is_some() || draft.reminder_time.is_some() {
        changes.notified = Set(false);
    }

    let result = ReminderEntity::update_many()
        .set(changes)
        .filter(reminder::Column::Id.eq(id))
        .filter(reminder::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            kind: KIND,
            key: id.to_string(),
        });
    }

    find_record(db, user_id, id).await.map(mapper::payment_to_view)
}

/// Deletes the payment with `id`.
#[instrument(skip(db))]
pub async fn delete_payment(db: &DatabaseConnection, user_id: &str, id: &str) -> Result<()> {
    let result = ReminderEntity::delete_many()
        .filter(reminder::Column::Id.eq(id))
        .filter(reminder::Column::UserId.eq(user_id))
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

/// Flips `is_paid` and nothing else. Returns the new paid state.
#[instrument(skip(db))]
pub async fn toggle_paid(db: &DatabaseConnection, user_id: &str, id: &str) -> Result<bool> {
    let existing = find_record(db, user_id, id).await?;
    let paid = !existing.is_paid;

    let changes = reminder::ActiveModel {
        is_paid: Set(paid),
        ..Default::default()
    };
    ReminderEntity::update_many()
        .set(changes)
        .filter(reminder::Column::Id.eq(id))
        .filter(reminder::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(paid)
}

/// Records that the reminder for this payment has been shown.
#[instrument(skip(db))]
pub async fn mark_notified(db: &DatabaseConnection, user_id: &str, id: &str) -> Result<()> {
    let changes = reminder::ActiveModel {
        notified: Set(true),
        ..Default::default()
    };
    ReminderEntity::update_many()
        .set(changes)
        .filter(reminder::Column::Id.eq(id))
        .filter(reminder::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}
