use crate::api::Mode;
use crate::app::{App, Applied};
use crate::args::NameArgs;
use crate::commands::Out;
use crate::model::Category;
use crate::{Config, Result};
use serde::Serialize;

/// A category and the number of budgets that use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryUsage {
    pub name: String,
    pub budgets: usize,
}

pub async fn category_list(config: Config, mode: Mode) -> Result<Out<Vec<CategoryUsage>>> {
    let app = App::open(config, mode).await?;
    let usage: Vec<CategoryUsage> = app
        .state()
        .categories()
        .iter()
        .map(|c| CategoryUsage {
            name: c.name().to_string(),
            budgets: app.state().category_usage(c.name()),
        })
        .collect();
    let lines: Vec<String> = usage
        .iter()
        .map(|u| format!("{} ({} budgets)", u.name, u.budgets))
        .collect();
    Ok(Out::new(lines.join("\n"), usage))
}

pub async fn category_add(config: Config, mode: Mode, args: &NameArgs) -> Result<Out<Category>> {
    let mut app = App::open(config, mode).await?;
    let Applied { value, warnings } = app.add_category(args.name()).await?;
    Ok(Out::new(format!("Added category '{value}'"), value).with_warnings(&warnings))
}

pub async fn category_delete(config: Config, mode: Mode, args: &NameArgs) -> Result<Out<Category>> {
    let mut app = App::open(config, mode).await?;
    let Applied { value, warnings } = app.delete_category(args.name()).await?;
    Ok(Out::new(format!("Deleted category '{value}'"), value).with_warnings(&warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_category_list() {
        let env = TestEnv::new().await;
        let out = category_list(env.config(), Mode::Testing).await.unwrap();
        let usage = out.structure().unwrap();
        assert_eq!(usage.len(), 5);
        assert_eq!(
            usage[0],
            CategoryUsage {
                name: "Food".into(),
                budgets: 1
            }
        );
        assert!(out.message().contains("Others (0 budgets)"));
    }

    #[tokio::test]
    async fn test_category_add_then_delete() {
        let env = TestEnv::new().await;
        let out = category_add(env.config(), Mode::Testing, &NameArgs::new("Savings"))
            .await
            .unwrap();
        assert_eq!(out.message(), "Added category 'Savings'");

        category_delete(env.config(), Mode::Testing, &NameArgs::new("Savings"))
            .await
            .unwrap();
        assert!(!env.app().await.state().has_category("Savings"));
    }

    #[tokio::test]
    async fn test_category_delete_in_use() {
        let env = TestEnv::new().await;
        let err = category_delete(env.config(), Mode::Testing, &NameArgs::new("Rent"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(env.app().await.state().has_category("Rent"));
    }
}
