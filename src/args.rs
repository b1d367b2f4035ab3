//! These structs provide the CLI interface for the budget CLI.

use crate::model::{Amount, BudgetFilter, Currency, Theme};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// budget: Track named budgets from the command line.
///
/// Budgets, categories and settings are kept in a local data directory. Optionally, changes can
/// also be sent to a remote budget service: turn this on with `budget sync enable` and point it
/// at your server with `budget sync url`. When the service is unreachable every change is still
/// saved locally.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List, add, update or delete budgets.
    Budget(BudgetArgs),
    /// List, add or delete categories.
    Category(CategoryArgs),
    /// Show or change settings.
    Settings(SettingsArgs),
    /// Control synchronization with the remote budget service.
    Sync(SyncArgs),
    /// Show dashboard statistics and trends.
    Stats(StatsArgs),
    /// Write all data to a dated JSON file.
    Export(ExportArgs),
    /// Replace local data with the contents of an exported JSON file.
    ///
    /// Budgets and categories in the file replace the current ones; settings in the file are
    /// merged over the current settings. A backup of the current data is saved first.
    Import(ImportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where budget data and configuration is held. Defaults to ~/.budgettrackr
    #[arg(long, env = "BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: PathBuf) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }
}

/// Args for the `budget budget` command.
#[derive(Debug, Parser, Clone)]
pub struct BudgetArgs {
    #[command(subcommand)]
    command: BudgetCommand,
}

impl BudgetArgs {
    pub fn command(&self) -> &BudgetCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum BudgetCommand {
    /// List budgets, optionally narrowed by category, date or text.
    List(ListArgs),
    /// Add a new budget.
    Add(AddBudgetArgs),
    /// Change an existing budget. Only the fields you pass are changed.
    Update(UpdateBudgetArgs),
    /// Delete a budget.
    Delete(IdArgs),
}

#[derive(Debug, Default, Parser, Clone)]
pub struct ListArgs {
    /// Only budgets in this category.
    #[arg(long)]
    category: Option<String>,

    /// Only budgets with this budget date (YYYY-MM-DD).
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Only budgets whose name, category or description contains this text (case-insensitive).
    #[arg(long)]
    search: Option<String>,
}

impl ListArgs {
    pub fn new(category: Option<String>, date: Option<NaiveDate>, search: Option<String>) -> Self {
        Self {
            category,
            date,
            search,
        }
    }

    pub fn filter(&self) -> BudgetFilter {
        BudgetFilter {
            category: self.category.clone(),
            date: self.date,
            search: self.search.clone(),
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct AddBudgetArgs {
    /// A name for the budget, e.g. "Monthly Groceries".
    #[arg(long)]
    name: String,

    /// The amount, e.g. 450 or 1,200.50. Must be greater than zero.
    #[arg(long)]
    amount: Amount,

    /// GHS, USD or EUR. Defaults to the default currency in settings.
    #[arg(long)]
    currency: Option<Currency>,

    /// The category, which must already exist.
    #[arg(long)]
    category: String,

    #[arg(long)]
    description: Option<String>,

    /// The date the budget belongs to (YYYY-MM-DD).
    #[arg(long)]
    budget_date: NaiveDate,

    /// The date the budget takes effect (YYYY-MM-DD).
    #[arg(long)]
    effective_date: NaiveDate,
}

impl AddBudgetArgs {
    pub fn new(
        name: impl Into<String>,
        amount: Amount,
        category: impl Into<String>,
        budget_date: NaiveDate,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            currency: None,
            category: category.into(),
            description: None,
            budget_date,
            effective_date,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn currency(&self) -> Option<Currency> {
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
}

#[derive(Debug, Default, Parser, Clone)]
pub struct UpdateBudgetArgs {
    /// The id of the budget to change.
    id: String,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    amount: Option<Amount>,

    #[arg(long)]
    currency: Option<Currency>,

    #[arg(long)]
    category: Option<String>,

    /// The new description. Pass an empty string to remove it.
    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    budget_date: Option<NaiveDate>,

    #[arg(long)]
    effective_date: Option<NaiveDate>,
}

impl UpdateBudgetArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    pub fn currency(&self) -> Option<Currency> {
        self.currency
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn budget_date(&self) -> Option<NaiveDate> {
        self.budget_date
    }

    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.effective_date
    }
}

#[derive(Debug, Parser, Clone)]
pub struct IdArgs {
    /// The id of the budget.
    id: String,
}

impl IdArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Args for the `budget category` command.
#[derive(Debug, Parser, Clone)]
pub struct CategoryArgs {
    #[command(subcommand)]
    command: CategoryCommand,
}

impl CategoryArgs {
    pub fn command(&self) -> &CategoryCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryCommand {
    /// List categories and how many budgets use each.
    List,
    /// Add a category.
    Add(NameArgs),
    /// Delete a category. Categories that are used by a budget cannot be deleted.
    Delete(NameArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct NameArgs {
    /// The category name.
    name: String,
}

impl NameArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Args for the `budget settings` command.
#[derive(Debug, Parser, Clone)]
pub struct SettingsArgs {
    #[command(subcommand)]
    command: SettingsCommand,
}

impl SettingsArgs {
    pub fn command(&self) -> &SettingsCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Show the current settings.
    Show,
    /// Change one or more settings.
    Set(SetSettingsArgs),
}

#[derive(Debug, Default, Parser, Clone)]
pub struct SetSettingsArgs {
    /// The default currency: GHS, USD or EUR.
    #[arg(long)]
    currency: Option<Currency>,

    /// The theme: glass, light or dark.
    #[arg(long, conflicts_with = "next_theme")]
    theme: Option<Theme>,

    /// The name used to greet you.
    #[arg(long)]
    user_name: Option<String>,

    /// Switch to the next theme in the cycle glass, light, dark.
    #[arg(long)]
    next_theme: bool,
}

impl SetSettingsArgs {
    pub fn new(
        currency: Option<Currency>,
        theme: Option<Theme>,
        user_name: Option<String>,
        next_theme: bool,
    ) -> Self {
        Self {
            currency,
            theme,
            user_name,
            next_theme,
        }
    }

    pub fn currency(&self) -> Option<Currency> {
        self.currency
    }

    pub fn theme(&self) -> Option<Theme> {
        self.theme
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn next_theme(&self) -> bool {
        self.next_theme
    }
}

/// Args for the `budget sync` command.
#[derive(Debug, Parser, Clone)]
pub struct SyncArgs {
    #[command(subcommand)]
    command: SyncCommand,
}

impl SyncArgs {
    pub fn command(&self) -> &SyncCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum SyncCommand {
    /// Show whether sync is enabled and which service it uses.
    Status,
    /// Start using the remote service. This pulls the remote data once.
    Enable,
    /// Stop using the remote service. Local data is kept.
    Disable,
    /// Replace local data with the remote data now.
    Pull,
    /// Set the base URL of the remote service, e.g. http://localhost:4000
    Url(UrlArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct UrlArgs {
    url: String,
}

impl UrlArgs {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    Monthly,
    Weekly,
}

serde_plain::derive_display_from_serialize!(Period);
serde_plain::derive_fromstr_from_deserialize!(Period);

/// Args for the `budget stats` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct StatsArgs {
    /// The trend to show: "monthly" or "weekly"
    #[arg(long, default_value_t = Period::Monthly)]
    period: Period,
}

impl StatsArgs {
    pub fn new(period: Period) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Period {
        self.period
    }
}

/// Args for the `budget export` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ExportArgs {
    /// The directory to write the export file to. Defaults to the current directory.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(out: Option<PathBuf>) -> Self {
        Self { out }
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }
}

/// Args for the `budget import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// The exported JSON file to import.
    file: PathBuf,
}

impl ImportArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join(".budgettrackr"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or BUDGET_HOME instead of relying on the default \
                budget home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from(".budgettrackr")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let args = Args::try_parse_from([
            "budget",
            "--budget-home",
            "/tmp/b",
            "budget",
            "add",
            "--name",
            "Rent",
            "--amount",
            "1,200",
            "--category",
            "Rent",
            "--budget-date",
            "2025-01-01",
            "--effective-date",
            "2025-01-07",
        ])
        .unwrap();
        assert_eq!(args.common().budget_home().path(), Path::new("/tmp/b"));
        let Command::Budget(budget) = args.command() else {
            panic!("expected the budget command");
        };
        let BudgetCommand::Add(add) = budget.command() else {
            panic!("expected budget add");
        };
        assert_eq!(add.amount(), Amount::from_str("1200").unwrap());
        assert_eq!(add.currency(), None);
        assert_eq!(add.effective_date(), NaiveDate::from_ymd_opt(2025, 1, 7).unwrap());
    }

    #[test]
    fn test_parse_settings_and_stats() {
        let args = Args::try_parse_from([
            "budget", "settings", "set", "--currency", "USD", "--theme", "dark",
        ])
        .unwrap();
        let Command::Settings(settings) = args.command() else {
            panic!("expected the settings command");
        };
        let SettingsCommand::Set(set) = settings.command() else {
            panic!("expected settings set");
        };
        assert_eq!(set.currency(), Some(Currency::Usd));
        assert_eq!(set.theme(), Some(Theme::Dark));
        assert!(!set.next_theme());

        let args = Args::try_parse_from(["budget", "stats", "--period", "weekly"]).unwrap();
        let Command::Stats(stats) = args.command() else {
            panic!("expected the stats command");
        };
        assert_eq!(stats.period(), Period::Weekly);
    }

    #[test]
    fn test_theme_conflicts_with_next_theme() {
        let result = Args::try_parse_from([
            "budget",
            "settings",
            "set",
            "--theme",
            "dark",
            "--next-theme",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_filter() {
        let args = Args::try_parse_from(["budget", "budget", "list", "--search", "rent"]).unwrap();
        let Command::Budget(budget) = args.command() else {
            panic!("expected the budget command");
        };
        let BudgetCommand::List(list) = budget.command() else {
            panic!("expected budget list");
        };
        let filter = list.filter();
        assert_eq!(filter.search.as_deref(), Some("rent"));
        assert!(filter.category.is_none());
    }
}
