//! Types that represent the core data model, such as `Budget`, `Category` and `Settings`.
mod amount;
pub(crate) mod budget;
mod category;
mod settings;
mod state;

pub use amount::{Amount, AmountError, Currency};
pub use budget::{Budget, BudgetDraft, BudgetFilter, BudgetPatch, Timestamp};
pub(crate) use category::RemoteCategory;
pub use category::Category;
pub use settings::{Settings, SettingsPatch, Theme};
pub use state::AppState;
