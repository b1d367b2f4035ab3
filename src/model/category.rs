use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The categories every new installation starts with.
pub(crate) const DEFAULT_CATEGORIES: [&str; 5] =
    ["Food", "Transport", "Rent", "Utilities", "Others"];

/// A budget category. Categories have no attributes beyond their unique name.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub(crate) fn defaults() -> Vec<Category> {
        DEFAULT_CATEGORIES.iter().map(|&n| Category::new(n)).collect()
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::new(value)
    }
}

/// A category as the remote service may send it: either `{"name": "Food"}` or `"Food"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RemoteCategory {
    Named { name: String },
    Bare(String),
}

impl From<RemoteCategory> for Category {
    fn from(value: RemoteCategory) -> Self {
        match value {
            RemoteCategory::Named { name } => Category(name),
            RemoteCategory::Bare(name) => Category(name),
        }
    }
}
