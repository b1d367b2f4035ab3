use crate::model::budget::generate_budget_id;
use crate::model::{
    Amount, Budget, BudgetDraft, BudgetFilter, Category, Currency, Settings, Timestamp,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the application persists locally, saved and loaded as one document:
///
/// ```json
/// { "budgets": [ ... ], "categories": ["Food", ...], "settings": { ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub(crate) budgets: Vec<Budget>,
    pub(crate) categories: Vec<Category>,
    pub(crate) settings: Settings,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            budgets: Vec::new(),
            categories: Category::defaults(),
            settings: Settings::default(),
        }
    }
}

impl AppState {
    pub fn new(budgets: Vec<Budget>, categories: Vec<Category>, settings: Settings) -> Self {
        Self {
            budgets,
            categories,
            settings,
        }
    }

    /// The state a brand-new installation starts with: default categories and settings plus a
    /// few example budgets.
    pub fn seeded() -> Self {
        let mut state = Self::default();
        state.seed_budgets();
        state
    }

    /// Replaces the budget list with the example budgets.
    pub(crate) fn seed_budgets(&mut self) {
        let midnight = day(2025, 1, 1).and_hms_opt(0, 0, 0).unwrap_or_default();
        let created = Timestamp::new(midnight.and_utc());
        let examples = [
            ("Monthly Groceries", 45000, "Food", "Monthly groceries and household items", 5),
            ("Transportation", 20000, "Transport", "Monthly transportation costs", 3),
            ("Rent Payment", 120000, "Rent", "Monthly rent payment", 7),
        ];
        self.budgets = examples
            .into_iter()
            .map(|(name, cents, category, description, effective_day)| {
                let draft = BudgetDraft::new(
                    name,
                    Amount::new(Decimal::new(cents, 2)),
                    Currency::Ghs,
                    category,
                    day(2025, 1, 1),
                    day(2025, 1, effective_day),
                )
                .with_description(description);
                Budget::from_draft(generate_budget_id(), draft, created)
            })
            .collect();
    }

    pub fn budgets(&self) -> &[Budget] {
        &self.budgets
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn budget(&self, id: &str) -> Option<&Budget> {
        self.budgets.iter().find(|b| b.id() == id)
    }

    pub(crate) fn budget_mut(&mut self, id: &str) -> Option<&mut Budget> {
        self.budgets.iter_mut().find(|b| b.id() == id)
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name() == name)
    }

    /// The number of budgets that reference the category `name`.
    pub fn category_usage(&self, name: &str) -> usize {
        self.budgets.iter().filter(|b| b.category() == name).count()
    }

    pub fn filter(&self, filter: &BudgetFilter) -> Vec<&Budget> {
        self.budgets.iter().filter(|b| filter.matches(b)).collect()
    }
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
