//! Aggregate statistics and trend series over the budget list.
//!
//! Sums only include budgets in the default currency, since amounts in different currencies are
//! never converted. Every function that depends on the current date takes `today` explicitly.

use crate::model::{Amount, AppState, Budget, Currency};
use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

const MONTHS: u32 = 12;
const WEEKS: u64 = 8;

/// The headline numbers of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub currency: Currency,
    /// Sum of all budgets in `currency`.
    pub total_budgeted: Amount,
    /// Number of distinct categories referenced by any budget.
    pub categories_used: usize,
    /// Number of budgets whose effective date is today or later.
    pub upcoming: usize,
}

/// One point of a trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub value: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub total: Amount,
}

/// Per-category totals and the category with the largest share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub currency: Currency,
    /// In the order categories are first seen in the budget list.
    pub shares: Vec<CategoryShare>,
    pub top: Option<TopCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCategory {
    pub category: String,
    /// Percentage of the overall total, rounded to one decimal place.
    pub percentage: f64,
}

pub fn dashboard(state: &AppState, today: NaiveDate) -> DashboardStats {
    let currency = state.settings().default_currency();
    let categories: HashSet<&str> = state.budgets().iter().map(Budget::category).collect();
    DashboardStats {
        currency,
        total_budgeted: sum(in_currency(state)),
        categories_used: categories.len(),
        upcoming: state
            .budgets()
            .iter()
            .filter(|b| b.effective_date() >= today)
            .count(),
    }
}

/// Twelve monthly totals by budget date, oldest first, ending with the month of `today`.
pub fn monthly_trend(state: &AppState, today: NaiveDate) -> Vec<TrendPoint> {
    let this_month = today.with_day(1).unwrap_or(today);
    (0..MONTHS)
        .rev()
        .filter_map(|back| this_month.checked_sub_months(Months::new(back)))
        .map(|month| TrendPoint {
            label: month.format("%b").to_string(),
            value: sum(in_currency(state).filter(|b| {
                let d = b.budget_date();
                d.year() == month.year() && d.month() == month.month()
            })),
        })
        .collect()
}

/// Eight weekly totals by budget date, oldest first. Point `i` covers the Sunday-to-Saturday week
/// containing `today - 7 * i` days.
pub fn weekly_trend(state: &AppState, today: NaiveDate) -> Vec<TrendPoint> {
    (0..WEEKS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back * 7)))
        .map(|date| {
            let from_sunday = date.weekday().num_days_from_sunday();
            let start = date - Days::new(u64::from(from_sunday));
            let end = start + Days::new(6);
            TrendPoint {
                label: format!("Week {}", (date.day() + from_sunday).div_ceil(7)),
                value: sum(in_currency(state).filter(|b| {
                    let d = b.budget_date();
                    d >= start && d <= end
                })),
            }
        })
        .collect()
}

/// The running total of `monthly_trend`.
pub fn cumulative_trend(state: &AppState, today: NaiveDate) -> Vec<TrendPoint> {
    let mut running = Decimal::ZERO;
    monthly_trend(state, today)
        .into_iter()
        .map(|point| {
            running += point.value.value();
            TrendPoint {
                label: point.label,
                value: Amount::new(running),
            }
        })
        .collect()
}

/// The running total at the end of the monthly window and the average it grew by each month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CumulativeGrowth {
    pub total: Amount,
    pub average_monthly: Amount,
}

/// Percentage change of this month's total over last month's, rounded to one decimal place.
/// `None` when last month's total is zero, so there is nothing to compare against.
pub fn month_over_month(state: &AppState, today: NaiveDate) -> Option<f64> {
    let trend = monthly_trend(state, today);
    let [.., previous, current] = trend.as_slice() else {
        return None;
    };
    let previous = previous.value.value();
    if previous <= Decimal::ZERO {
        return None;
    }
    ((current.value.value() - previous) * Decimal::ONE_HUNDRED / previous)
        .round_dp(1)
        .to_f64()
}

pub fn cumulative_growth(state: &AppState, today: NaiveDate) -> CumulativeGrowth {
    let cumulative = cumulative_trend(state, today);
    let total = cumulative.last().map(|p| p.value).unwrap_or_default();
    let average = match cumulative.len() {
        0 => Decimal::ZERO,
        months => (total.value() / Decimal::from(months)).round_dp(2),
    };
    CumulativeGrowth {
        total,
        average_monthly: Amount::new(average),
    }
}

pub fn category_breakdown(state: &AppState) -> CategoryBreakdown {
    let mut shares: Vec<CategoryShare> = Vec::new();
    for budget in in_currency(state) {
        let amount = budget.amount().value();
        match shares.iter_mut().find(|s| s.category == budget.category()) {
            Some(share) => share.total = Amount::new(share.total.value() + amount),
            None => shares.push(CategoryShare {
                category: budget.category().to_string(),
                total: budget.amount(),
            }),
        }
    }

    let overall: Decimal = shares.iter().map(|s| s.total.value()).sum();
    let mut top: Option<&CategoryShare> = None;
    for share in &shares {
        if top.map(|t| share.total > t.total).unwrap_or(true) {
            top = Some(share);
        }
    }
    let top = top.filter(|_| !overall.is_zero()).map(|share| TopCategory {
        category: share.category.clone(),
        percentage: (share.total.value() * Decimal::ONE_HUNDRED / overall)
            .round_dp(1)
            .to_f64()
            .unwrap_or_default(),
    });

    CategoryBreakdown {
        currency: state.settings().default_currency(),
        shares,
        top,
    }
}

fn in_currency(state: &AppState) -> impl Iterator<Item = &Budget> {
    let currency = state.settings().default_currency();
    state
        .budgets()
        .iter()
        .filter(move |b| b.currency() == currency)
}

fn sum<'a>(budgets: impl Iterator<Item = &'a Budget>) -> Amount {
    Amount::new(budgets.map(|b| b.amount().value()).sum())
}
