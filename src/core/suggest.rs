//! Suggestion heuristics - keyword lookups that pre-fill forms.
//!
//! Everything here is a pure function over view models: category and color
//! suggestions for notes, categories and reminder times for payments, and a
//! small per-category spending summary.

use crate::models::Payment;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Color used for categories without a dedicated one.
pub const FALLBACK_COLOR: &str = "#6B7280";

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Work",
        &["meeting", "project", "presentation", "report", "client", "office"],
    ),
    (
        "Shopping",
        &["market", "shopping", "buy", "store", "product", "order"],
    ),
    (
        "Health",
        &["doctor", "hospital", "medicine", "exercise", "gym", "diet"],
    ),
    (
        "Education",
        &["lesson", "homework", "exam", "course", "study", "learn"],
    ),
];

const PAYMENT_KEYWORDS: &[(&str, &[&str])] = &[
    ("Bills", &["electric", "water", "gas", "internet", "phone"]),
    ("Housing", &["rent", "mortgage", "maintenance fee"]),
    ("Food", &["grocer", "market", "restaurant", "food"]),
    ("Transport", &["fuel", "petrol", "bus", "taxi", "transit"]),
    ("Entertainment", &["netflix", "spotify", "cinema", "streaming"]),
];

fn first_match(text: &str, table: &[(&'static str, &[&str])]) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, words)| words.iter().any(|word| text.contains(word)))
        .map(|(category, _)| *category)
}

/// Suggests a note category from its title and body.
#[must_use]
pub fn suggest_category(title: &str, description: &str) -> &'static str {
    let text = format!("{title} {description}").to_lowercase();
    first_match(&text, CATEGORY_KEYWORDS).unwrap_or("Personal")
}

/// Suggests a tag color for a category name.
#[must_use]
pub fn suggest_tag_color(category: &str) -> &'static str {
    match category {
        "Work" => "#3B82F6",
        "Personal" => "#10B981",
        "Important" => "#F59E0B",
        "Idea" => "#8B5CF6",
        "Shopping" => "#EF4444",
        "Health" => "#06B6D4",
        "Education" => "#F97316",
        "Finance" => "#84CC16",
        "Travel" => "#EC4899",
        _ => FALLBACK_COLOR,
    }
}

/// Buckets a payment title into a spending category.
#[must_use]
pub fn categorize_payment(title: &str) -> &'static str {
    first_match(&title.to_lowercase(), PAYMENT_KEYWORDS).unwrap_or("Other")
}

/// Suggests when to be reminded of something due at `due`:
/// bills three days ahead at 09:00, meetings an hour ahead, anything else the
/// day before at 10:00.
#[must_use]
pub fn suggest_reminder_time(title: &str, due: DateTime<Utc>) -> DateTime<Utc> {
    let title = title.to_lowercase();
    let at_hour = |date: DateTime<Utc>, hour: u32| {
        NaiveTime::from_hms_opt(hour, 0, 0)
            .map_or(date, |time| date.date_naive().and_time(time).and_utc())
    };

    if ["bill", "electric", "water"].iter().any(|w| title.contains(w)) {
        at_hour(due - Duration::days(3), 9)
    } else if ["meeting", "appointment"].iter().any(|w| title.contains(w)) {
        due - Duration::hours(1)
    } else {
        at_hour(due - Duration::days(1), 10)
    }
}

/// Direction of spending within a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Spending summary for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendingPattern {
    /// Category from [`categorize_payment`]
    pub category: &'static str,
    /// Number of payments in the category
    pub count: usize,
    /// Mean amount
    pub average_amount: Decimal,
    /// Last three payments against the ones before them
    pub trend: Trend,
}

fn average(amounts: &[Decimal]) -> Decimal {
    if amounts.is_empty() {
        return Decimal::ZERO;
    }
    amounts.iter().sum::<Decimal>() / Decimal::from(amounts.len())
}

fn trend_of(amounts: &[Decimal]) -> Trend {
    // Needs older payments to compare the most recent three against.
    if amounts.len() <= 3 {
        return Trend::Stable;
    }
    let (older, recent) = amounts.split_at(amounts.len() - 3);
    let older_avg = average(older);
    if older_avg.is_zero() {
        return Trend::Stable;
    }
    let change = (average(recent) - older_avg) / older_avg;
    let threshold = Decimal::new(1, 1);
    if change > threshold {
        Trend::Increasing
    } else if change < -threshold {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Groups payments by category, oldest due date first within each group.
#[must_use]
pub fn analyze_spending(payments: &[Payment]) -> Vec<SpendingPattern> {
    let mut groups: BTreeMap<&'static str, Vec<&Payment>> = BTreeMap::new();
    for payment in payments {
        groups
            .entry(categorize_payment(&payment.title))
            .or_default()
            .push(payment);
    }

    groups
        .into_iter()
        .map(|(category, mut group)| {
            group.sort_by_key(|p| p.due_date);
            let amounts: Vec<Decimal> = group.iter().map(|p| p.amount).collect();
            SpendingPattern {
                category,
                count: amounts.len(),
                average_amount: average(&amounts),
                trend: trend_of(&amounts),
            }
        })
        .collect()
}
