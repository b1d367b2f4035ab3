use crate::api::Mode;
use crate::app::{App, Applied};
use crate::args::{AddBudgetArgs, IdArgs, ListArgs, UpdateBudgetArgs};
use crate::commands::Out;
use crate::model::{Budget, BudgetDraft};
use crate::{Config, Error, Result};

/// Lists the budgets that match the filters in `args`.
pub async fn budget_list(config: Config, mode: Mode, args: &ListArgs) -> Result<Out<Vec<Budget>>> {
    let app = App::open(config, mode).await?;
    let budgets: Vec<Budget> = app
        .state()
        .filter(&args.filter())
        .into_iter()
        .cloned()
        .collect();

    if budgets.is_empty() {
        return Ok(Out::new("No budgets found", budgets));
    }
    let rows: Vec<String> = budgets.iter().map(row).collect();
    let message = format!("{} budget(s)\n{}", budgets.len(), rows.join("\n"));
    Ok(Out::new(message, budgets))
}

pub async fn budget_add(config: Config, mode: Mode, args: &AddBudgetArgs) -> Result<Out<Budget>> {
    let mut app = App::open(config, mode).await?;
    let currency = args
        .currency()
        .unwrap_or_else(|| app.state().settings().default_currency());
    let mut draft = BudgetDraft::new(
        args.name(),
        args.amount(),
        currency,
        args.category(),
        args.budget_date(),
        args.effective_date(),
    );
    if let Some(description) = args.description() {
        draft = draft.with_description(description);
    }

    let Applied { value, warnings } = app.create_budget(draft).await?;
    Ok(Out::new(format!("Added budget {}", row(&value)), value).with_warnings(&warnings))
}

/// Changes the fields given in `args`, keeping the rest of the budget as it is.
pub async fn budget_update(
    config: Config,
    mode: Mode,
    args: &UpdateBudgetArgs,
) -> Result<Out<Budget>> {
    let mut app = App::open(config, mode).await?;
    let existing = app
        .state()
        .budget(args.id())
        .ok_or_else(|| Error::validation(format!("Budget '{}' not found", args.id())))?;

    let mut draft = BudgetDraft::from(existing);
    if let Some(name) = args.name() {
        draft.name = name.to_string();
    }
    if let Some(amount) = args.amount() {
        draft.amount = amount;
    }
    if let Some(currency) = args.currency() {
        draft.currency = currency;
    }
    if let Some(category) = args.category() {
        draft.category = category.to_string();
    }
    if let Some(description) = args.description() {
        draft.description = Some(description.to_string());
    }
    if let Some(budget_date) = args.budget_date() {
        draft.budget_date = budget_date;
    }
    if let Some(effective_date) = args.effective_date() {
        draft.effective_date = effective_date;
    }

    let Applied { value, warnings } = app.update_budget(args.id(), draft).await?;
    Ok(Out::new(format!("Updated budget {}", row(&value)), value).with_warnings(&warnings))
}

pub async fn budget_delete(config: Config, mode: Mode, args: &IdArgs) -> Result<Out<Budget>> {
    let mut app = App::open(config, mode).await?;
    let Applied { value, warnings } = app.delete_budget(args.id()).await?;
    Ok(Out::new(format!("Deleted budget '{}'", value.name()), value).with_warnings(&warnings))
}

fn row(budget: &Budget) -> String {
    format!(
        "{}  {}  {}  {}  [{}]",
        budget.id(),
        budget.budget_date(),
        budget.name(),
        budget.amount().format_money(budget.currency()),
        budget.category()
    )
}
