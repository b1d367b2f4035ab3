use crate::model::{Amount, Category, Currency};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// A point in time attached to a budget (`createdAt`, `updatedAt`).
///
/// Written as RFC 3339 in UTC. Reading also accepts naive ISO date-times, which the remote
/// service emits for timezone-less columns, and treats them as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn new(value: DateTime<Utc>) -> Self {
        Self(value)
    }

    pub fn value(&self) -> DateTime<Utc> {
        self.0
    }

    fn parse(s: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(Self(naive.and_utc()));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Self(naive.and_utc()))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid timestamp '{s}'")))
    }
}

/// Generates an identifier for a budget that was not assigned one by the remote service.
pub(crate) fn generate_budget_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A single budget line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    id: String,
    name: String,
    amount: Amount,
    currency: Currency,
    category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    budget_date: NaiveDate,
    effective_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<Timestamp>,
}

impl Budget {
    /// Creates a budget from user input, with the given `id` and both timestamps set to `now`.
    pub fn from_draft(id: impl Into<String>, draft: BudgetDraft, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            name: draft.name,
            amount: draft.amount,
            currency: draft.currency,
            category: draft.category,
            description: draft.description,
            budget_date: draft.budget_date,
            effective_date: draft.effective_date,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Creates a budget with a locally generated identifier.
    pub fn new_local(draft: BudgetDraft) -> Self {
        Self::from_draft(generate_budget_id(), draft, Timestamp::now())
    }

    /// Overwrites the user-editable fields with `draft` and bumps `updatedAt`.
    pub(crate) fn apply_draft(&mut self, draft: BudgetDraft, now: Timestamp) {
        self.name = draft.name;
        self.amount = draft.amount;
        self.currency = draft.currency;
        self.category = draft.category;
        self.description = draft.description;
        self.budget_date = draft.budget_date;
        self.effective_date = draft.effective_date;
        self.updated_at = Some(now);
    }

    /// Overlays whatever fields are present in `patch`, leaving the rest untouched.
    pub(crate) fn merge(&mut self, patch: BudgetPatch) {
        if let Some(id) = patch.id {
            self.id = id;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(currency) = patch.currency {
            self.currency = currency;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(budget_date) = patch.budget_date {
            self.budget_date = budget_date;
        }
        if let Some(effective_date) = patch.effective_date {
            self.effective_date = effective_date;
        }
        if let Some(created_at) = patch.created_at {
            self.created_at = Some(created_at);
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = Some(updated_at);
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn budget_date(&self) -> NaiveDate {
        self.budget_date
    }

    pub fn effective_date(&self) -> NaiveDate {
        self.effective_date
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }
}

/// The user-entered fields of a budget. This is also the request body for creating and updating
/// budgets on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetDraft {
    pub name: String,
    pub amount: Amount,
    pub currency: Currency,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub budget_date: NaiveDate,
    pub effective_date: NaiveDate,
}

impl BudgetDraft {
    pub fn new(
        name: impl Into<String>,
        amount: Amount,
        currency: Currency,
        category: impl Into<String>,
        budget_date: NaiveDate,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            currency,
            category: category.into(),
            description: None,
            budget_date,
            effective_date,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Trims text fields and drops an empty description.
    pub(crate) fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }

    /// Checks the draft against the current category set. Call on a normalized draft.
    pub(crate) fn validate(&self, categories: &[Category]) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation("Budget name is required"));
        }
        if !self.amount.is_positive() {
            return Err(Error::validation("Amount must be greater than 0"));
        }
        if self.category.is_empty() {
            return Err(Error::validation("Budget category is required"));
        }
        if !categories.iter().any(|c| c.name() == self.category) {
            return Err(Error::validation(format!(
                "Category '{}' does not exist. Add it first.",
                self.category
            )));
        }
        Ok(())
    }
}

impl From<&Budget> for BudgetDraft {
    fn from(budget: &Budget) -> Self {
        Self {
            name: budget.name.clone(),
            amount: budget.amount,
            currency: budget.currency,
            category: budget.category.clone(),
            description: budget.description.clone(),
            budget_date: budget.budget_date,
            effective_date: budget.effective_date,
        }
    }
}

/// Any subset of a budget's fields, as returned by the remote service after an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetPatch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub amount: Option<Amount>,
    pub currency: Option<Currency>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub budget_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// Narrows a list of budgets the way the budgets table does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetFilter {
    /// Exact category name.
    pub category: Option<String>,
    /// Exact budget date.
    pub date: Option<NaiveDate>,
    /// Case-insensitive text found in the name, category or description.
    pub search: Option<String>,
}

impl BudgetFilter {
    pub fn matches(&self, budget: &Budget) -> bool {
        if let Some(category) = &self.category {
            if budget.category() != category {
                return false;
            }
        }
        if let Some(date) = self.date {
            if budget.budget_date() != date {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if search.is_empty() {
                return true;
            }
            let needle = search.to_lowercase();
            let hit = budget.name().to_lowercase().contains(&needle)
                || budget.category().to_lowercase().contains(&needle)
                || budget
                    .description()
                    .map(|d| d.to_lowercase().contains(&needle))
                    .unwrap_or(false);
            if !hit {
                return false;
            }
        }
        true
    }
}
