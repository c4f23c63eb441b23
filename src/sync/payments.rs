use super::{EntityStore, SyncKind, ToggleKind};
use crate::{
    core::payments,
    errors::Result,
    models::{Payment, PaymentDraft, Recurrence},
    notify::{FollowUp, NotificationPayload},
};
use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::warn;

/// Payment kind: the paid flag is its toggle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Payments;

/// Payments of the signed-in user, earliest due date first.
pub type PaymentsStore = EntityStore<Payments>;

impl SyncKind for Payments {
    type View = Payment;
    type Draft = PaymentDraft;

    const LABEL: &'static str = "payment";

    fn draft_key(draft: &PaymentDraft) -> Option<&str> {
        draft.id.as_deref()
    }

    fn key_of(payment: &Payment) -> &str {
        &payment.id
    }

    async fn fetch(&self, db: &DatabaseConnection, user_id: &str) -> Result<Vec<Payment>> {
        payments::fetch_payments(db, user_id).await
    }

    async fn create(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
        draft: &PaymentDraft,
    ) -> Result<Payment> {
        payments::create_payment(db, user_id, draft).await
    }

    async fn update(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
        key: &str,
        draft: &PaymentDraft,
    ) -> Result<Payment> {
        payments::update_payment(db, user_id, key, draft).await
    }

    async fn delete(&self, db: &DatabaseConnection, user_id: &str, key: &str) -> Result<()> {
        payments::delete_payment(db, user_id, key).await
    }

    /// Unpaid payments remind at their reminder time, or at the due date when
    /// none is set. A reminder that was already shown is not armed again.
    fn reminder(&self, saved: &Payment) -> Option<(DateTime<Utc>, NotificationPayload)> {
        if saved.is_paid || saved.notified {
            return None;
        }
        let at = saved.reminder_time.unwrap_or(saved.due_date);
        if at <= Utc::now() {
            return None;
        }
        let payload =
            NotificationPayload::payment_reminder(&saved.id, &saved.title, &saved.amount.to_string());
        Some((at, payload))
    }

    fn reminder_tag(&self, key: &str) -> Option<String> {
        Some(NotificationPayload::payment_tag(key))
    }

    fn after_reminder(
        &self,
        db: Arc<DatabaseConnection>,
        user_id: String,
        payment: &Payment,
    ) -> Option<FollowUp> {
        let id = payment.id.clone();
        Some(Box::pin(async move {
            if let Err(e) = payments::mark_notified(&db, &user_id, &id).await {
                warn!("Failed to mark payment {} notified: {}", id, e);
            }
        }))
    }
}

impl ToggleKind for Payments {
    async fn toggle(&self, db: &DatabaseConnection, user_id: &str, key: &str) -> Result<bool> {
        payments::toggle_paid(db, user_id, key).await
    }
}

/// Totals over the loaded payments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentStats {
    /// Number of payments
    pub count: usize,
    /// Sum of every amount
    pub total: Decimal,
    /// Sum of paid amounts
    pub paid: Decimal,
    /// Sum of unpaid amounts
    pub unpaid: Decimal,
    /// Sum of overdue amounts
    pub overdue: Decimal,
    /// Number of overdue payments
    pub overdue_count: usize,
    /// Unpaid payments due in the next seven days
    pub upcoming: usize,
    /// Payments that recur every month
    pub monthly_recurring: usize,
    /// Distinct non-blank categories
    pub categories: usize,
}

/// Paid amounts for one calendar month, by due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlySpending {
    /// 1 (January) to 12
    pub month: u32,
    /// Sum of the month's paid amounts
    pub total: Decimal,
    /// Number of paid payments
    pub count: usize,
    /// Sum per non-blank category
    pub categories: BTreeMap<String, Decimal>,
}

impl EntityStore<Payments> {
    /// Marks the payment with `id` paid or unpaid.
    pub async fn toggle_paid(&mut self, id: &str) {
        self.toggle(id).await;
    }

    /// Unpaid payments due between `now` and `days` days later.
    #[must_use]
    pub fn upcoming(&self, now: DateTime<Utc>, days: i64) -> Vec<&Payment> {
        let horizon = now + Duration::days(days);
        self.items
            .iter()
            .filter(|p| !p.is_paid && p.due_date >= now && p.due_date <= horizon)
            .collect()
    }

    /// Unpaid payments whose due date has passed.
    #[must_use]
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<&Payment> {
        self.items.iter().filter(|p| p.is_overdue(now)).collect()
    }

    /// Payments filed under `category`, earliest due date first.
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<&Payment> {
        self.items
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Distinct categories in use, trimmed and sorted. Blank ones are skipped.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|p| p.category.trim())
            .filter(|category| !category.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Twelve buckets of paid amounts for `year`.
    #[must_use]
    pub fn monthly_spending(&self, year: i32) -> Vec<MonthlySpending> {
        let mut months: Vec<MonthlySpending> = (1..=12)
            .map(|month| MonthlySpending {
                month,
                ..MonthlySpending::default()
            })
            .collect();
        let paid = self
            .items
            .iter()
            .filter(|p| p.is_paid && p.due_date.year() == year);
        for payment in paid {
            let Some(bucket) = months.get_mut(payment.due_date.month0() as usize) else {
                continue;
            };
            bucket.total += payment.amount;
            bucket.count += 1;
            let category = payment.category.trim();
            if !category.is_empty() {
                *bucket
                    .categories
                    .entry(category.to_string())
                    .or_default() += payment.amount;
            }
        }
        months
    }

    /// Totals over the loaded payments as of `now`.
    #[must_use]
    pub fn stats(&self, now: DateTime<Utc>) -> PaymentStats {
        let stats = self
            .items
            .iter()
            .fold(PaymentStats::default(), |mut stats, payment| {
                stats.count += 1;
                stats.total += payment.amount;
                if payment.is_paid {
                    stats.paid += payment.amount;
                } else {
                    stats.unpaid += payment.amount;
                }
                if payment.is_overdue(now) {
                    stats.overdue += payment.amount;
                    stats.overdue_count += 1;
                }
                if payment.recurrence == Recurrence::Monthly {
                    stats.monthly_recurring += 1;
                }
                stats
            });
        PaymentStats {
            upcoming: self.upcoming(now, 7).len(),
            categories: self.categories().len(),
            ..stats
        }
    }
}
