use crate::api::Mode;
use crate::app::App;
use crate::args::{Period, StatsArgs};
use crate::commands::Out;
use crate::model::AppState;
use crate::stats::{self, CategoryBreakdown, CumulativeGrowth, DashboardStats, TrendPoint};
use crate::{Config, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;

/// Everything the dashboard shows, computed for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub dashboard: DashboardStats,
    pub period: Period,
    pub trend: Vec<TrendPoint>,
    pub cumulative: Vec<TrendPoint>,
    pub breakdown: CategoryBreakdown,
    /// Percentage change over last month, `None` when last month had no budgets.
    pub month_over_month: Option<f64>,
    pub growth: CumulativeGrowth,
}

pub async fn stats(config: Config, mode: Mode, args: &StatsArgs) -> Result<Out<StatsReport>> {
    let app = App::open(config, mode).await?;
    let today = Local::now().date_naive();
    Ok(report(app.state(), args.period(), today))
}

fn report(state: &AppState, period: Period, today: NaiveDate) -> Out<StatsReport> {
    let dashboard = stats::dashboard(state, today);
    let trend = match period {
        Period::Monthly => stats::monthly_trend(state, today),
        Period::Weekly => stats::weekly_trend(state, today),
    };
    let cumulative = stats::cumulative_trend(state, today);
    let breakdown = stats::category_breakdown(state);
    let month_over_month = stats::month_over_month(state, today);
    let growth = stats::cumulative_growth(state, today);

    let currency = dashboard.currency;
    let mut lines = vec![
        format!(
            "Total budgeted: {}",
            dashboard.total_budgeted.format_money(currency)
        ),
        format!("Categories used: {}", dashboard.categories_used),
        format!("Upcoming budgets: {}", dashboard.upcoming),
    ];
    if let Some(top) = &breakdown.top {
        lines.push(format!("Top category: {} ({}%)", top.category, top.percentage));
    }
    lines.push(match month_over_month {
        Some(change) if change > 0.0 => {
            format!("This month's budget is {change:.1}% higher than last month")
        }
        Some(change) if change < 0.0 => {
            format!("This month's budget is {:.1}% lower than last month", -change)
        }
        Some(_) => "This month's budget is the same as last month".to_string(),
        None => "This is your first month with budget data".to_string(),
    });
    lines.push(format!(
        "Cumulative budget: {}, an average monthly growth of {}",
        growth.total.format_money(currency),
        growth.average_monthly.format_money(currency)
    ));
    lines.push(format!("{period} trend:"));
    lines.extend(
        trend
            .iter()
            .map(|p| format!("  {}: {}", p.label, p.value.format_money(currency))),
    );

    let report = StatsReport {
        dashboard,
        period,
        trend,
        cumulative,
        breakdown,
        month_over_month,
        growth,
    };
    Out::new(lines.join("\n"), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use std::str::FromStr;

    #[test]
    fn test_report_seeded() {
        let state = AppState::seeded();
        let today = NaiveDate::from_str("2025-01-04").unwrap();
        let out = report(&state, Period::Monthly, today);

        let message = out.message();
        assert!(message.contains("Total budgeted: ₵1,850.00"), "{message}");
        assert!(message.contains("Categories used: 3"), "{message}");
        assert!(message.contains("Upcoming budgets: 2"), "{message}");
        assert!(message.contains("Top category: Rent (64.9%)"), "{message}");
        assert!(
            message.contains("This is your first month with budget data"),
            "{message}"
        );
        let growth = "Cumulative budget: ₵1,850.00, an average monthly growth of ₵154.17";
        assert!(message.contains(growth), "{message}");
        assert!(message.contains("monthly trend:"), "{message}");

        let report = out.structure().unwrap();
        assert_eq!(report.trend.len(), 12);
        assert_eq!(report.trend.last().unwrap().label, "Jan");
    }

    #[test]
    fn test_report_month_over_month() {
        let state = AppState::seeded();
        let out = report(&state, Period::Monthly, NaiveDate::from_str("2025-02-10").unwrap());
        let message = out.message();
        assert!(
            message.contains("This month's budget is 100.0% lower than last month"),
            "{message}"
        );
        assert_eq!(out.structure().unwrap().month_over_month, Some(-100.0));
    }

    #[test]
    fn test_report_weekly() {
        let state = AppState::seeded();
        let today = NaiveDate::from_str("2025-01-04").unwrap();
        let out = report(&state, Period::Weekly, today);
        assert_eq!(out.structure().unwrap().trend.len(), 8);
    }

    #[tokio::test]
    async fn test_stats_command() {
        let env = TestEnv::new().await;
        let out = stats(env.config(), Mode::Testing, &StatsArgs::default())
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().dashboard.categories_used, 3);
    }
}
