//! Financial health scoring.
//!
//! Four component scores between 0 and 100 are combined into a weighted overall score:
//! savings 30%, debt 30%, spending against budgets 25% and investments 15%. Every
//! window is measured back from `today`.

use crate::{
    core::{
        budget, goal,
        money::{round_cents, round_half_away, round_half_ceil},
        period, transaction as tx,
    },
    entities::{budget as budget_entity, financial_goal, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::{collections::HashSet, fmt};
use tracing::{debug, instrument};

const SAVINGS_WEIGHT: f64 = 0.3;
const DEBT_WEIGHT: f64 = 0.3;
const BUDGET_WEIGHT: f64 = 0.25;
const INVESTMENT_WEIGHT: f64 = 0.15;

const NEUTRAL_SCORE: f64 = 50.0;
const NO_INVESTMENT_SCORE: f64 = 40.0;
const PREVIOUS_SCORE: f64 = 68.0;
const RECOMMEND_BELOW: f64 = 80.0;
const CREDIT_UTILIZATION: f64 = 28.0;

const DEBT_PAYMENT: &str = "Debt Payment";
const INVESTMENT: &str = "Investment";
const EMERGENCY_FUND: &str = "Emergency Fund";
const SAVINGS: &str = "Savings";
const RETIREMENT: &str = "Retirement";

/// Data a health assessment is computed from.
#[derive(Debug, Clone, Default)]
pub struct HealthInputs {
    pub transactions: Vec<transaction::Model>,
    pub budgets: Vec<budget_entity::Model>,
    pub goals: Vec<financial_goal::Model>,
}

/// Value or target of a metric: a number, or a label such as `"Moderate"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Label(&'static str),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Label(l) => f.write_str(l),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Good,
    Warning,
}

impl MetricStatus {
    const fn from_good(good: bool) -> Self {
        if good { Self::Good } else { Self::Warning }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthMetric {
    pub name: &'static str,
    pub value: MetricValue,
    pub target: MetricValue,
    pub unit: &'static str,
    pub status: MetricStatus,
}

/// Score card for one area of the user's finances.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCategory {
    pub id: &'static str,
    pub name: &'static str,
    pub score: f64,
    pub recommendations: Vec<&'static str>,
    pub metrics: Vec<HealthMetric>,
}

/// Overall assessment returned by [`health_score`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub overall_score: f64,
    pub previous_score: f64,
    pub status: &'static str,
    pub last_updated: NaiveDate,
    pub categories: Vec<HealthCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub month: String,
    pub score: f64,
}

/// Catalogue entry describing what a score card measures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub metrics: [&'static str; 3],
}

/// Acknowledgement for submitted health goals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalsUpdate {
    pub success: bool,
    pub message: &'static str,
    pub goals: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Income and absolute expenses over a window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Flow {
    income: f64,
    expenses: f64,
}

impl Flow {
    fn over(transactions: &[transaction::Model], start: NaiveDate, end: NaiveDate) -> Self {
        transactions
            .iter()
            .filter(|t| t.date >= start && t.date <= end)
            .fold(Self::default(), |mut flow, t| {
                if t.amount > 0.0 {
                    flow.income += t.amount;
                } else if t.amount < 0.0 {
                    flow.expenses += t.amount.abs();
                }
                flow
            })
    }

    fn savings(self) -> f64 {
        self.income - self.expenses
    }
}

fn in_category<'a>(
    transactions: &'a [transaction::Model],
    category: &'a str,
) -> impl Iterator<Item = &'a transaction::Model> {
    transactions
        .iter()
        .filter(move |t| t.category.as_deref() == Some(category))
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Whole percentage of `part` in `whole` at two decimal places of ratio; zero without a base.
fn whole_percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    (round_half_away(part / whole, 2) * 100.0).round()
}

/// Overall status label for a score.
#[must_use]
pub fn status_for(score: f64) -> &'static str {
    if score >= 80.0 {
        "Excellent"
    } else if score >= 70.0 {
        "Good"
    } else if score >= 60.0 {
        "Fair"
    } else {
        "Needs Attention"
    }
}

struct Scorer<'a> {
    inputs: &'a HealthInputs,
    today: NaiveDate,
    quarter: Flow,
    month: Flow,
}

impl<'a> Scorer<'a> {
    fn new(inputs: &'a HealthInputs, today: NaiveDate) -> Result<Self> {
        let quarter = Flow::over(&inputs.transactions, period::shift_months(today, -3)?, today);
        let month = Flow::over(&inputs.transactions, period::shift_months(today, -1)?, today);
        Ok(Self {
            inputs,
            today,
            quarter,
            month,
        })
    }

    /// Savings rate over three months, times five: a 20% rate scores full marks.
    fn savings(&self) -> f64 {
        if self.quarter.income == 0.0 {
            return NEUTRAL_SCORE;
        }
        let rate = round_half_away(self.quarter.savings() / self.quarter.income, 4) * 100.0;
        clamp_score(rate * 5.0)
    }

    /// Debt payments against last month's income, two points lost per percent.
    fn debt(&self) -> f64 {
        if self.month.income == 0.0 {
            return NEUTRAL_SCORE;
        }
        let payments: f64 = in_category(&self.inputs.transactions, DEBT_PAYMENT)
            .map(|t| t.amount.abs())
            .sum();
        let ratio = round_half_away(payments / self.month.income, 4) * 100.0;
        clamp_score(100.0 - ratio * 2.0)
    }

    /// Mean adherence over budgets with a positive amount; overspending costs one point
    /// per percent over.
    fn budget(&self) -> f64 {
        let scores: Vec<f64> = self
            .inputs
            .budgets
            .iter()
            .filter(|b| b.amount > 0.0)
            .map(|b| {
                let end = b.end_date.unwrap_or(self.today);
                let spent: f64 = in_category(&self.inputs.transactions, &b.category)
                    .filter(|t| t.amount < 0.0 && t.date >= b.start_date && t.date <= end)
                    .map(|t| t.amount.abs())
                    .sum();
                let adherence = round_half_away(spent / b.amount, 4);
                if adherence <= 1.0 {
                    100.0
                } else {
                    (100.0 - (adherence - 1.0) * 100.0).max(0.0)
                }
            })
            .collect();
        if scores.is_empty() {
            return NEUTRAL_SCORE;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = scores.len() as f64;
        scores.iter().sum::<f64>() / count
    }

    fn investment(&self) -> f64 {
        let goals: Vec<&financial_goal::Model> = self
            .inputs
            .goals
            .iter()
            .filter(|g| g.category == INVESTMENT)
            .collect();
        let investments: Vec<&transaction::Model> =
            in_category(&self.inputs.transactions, INVESTMENT).collect();
        if goals.is_empty() && investments.is_empty() {
            return NO_INVESTMENT_SCORE;
        }

        let kinds: HashSet<&str> = investments.iter().map(|t| t.description.as_str()).collect();
        let regular = investments.iter().filter(|t| t.amount > 0.0).count();
        #[allow(clippy::cast_precision_loss)]
        let diversity = (kinds.len() as f64 * 20.0).min(100.0);
        #[allow(clippy::cast_precision_loss)]
        let regularity = (regular as f64 * 10.0).min(100.0);

        if goals.is_empty() {
            return (diversity + regularity) / 2.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let goal_count = goals.len() as f64;
        let goal_score = goals
            .iter()
            .map(|g| (g.current_amount / g.target_amount * 100.0).min(100.0))
            .sum::<f64>()
            / goal_count;
        (goal_score + diversity + regularity) / 3.0
    }

    /// Months of expenses covered by emergency fund goals plus positive savings deposits.
    fn emergency_fund_months(&self) -> f64 {
        let monthly_expenses = round_cents(self.quarter.expenses / 3.0);
        if monthly_expenses == 0.0 {
            return 0.0;
        }
        let goals: f64 = self
            .inputs
            .goals
            .iter()
            .filter(|g| g.category == EMERGENCY_FUND)
            .map(|g| g.current_amount)
            .sum();
        let deposits: f64 = in_category(&self.inputs.transactions, SAVINGS)
            .filter(|t| t.amount > 0.0)
            .map(|t| t.amount)
            .sum();
        round_half_away((goals + deposits) / monthly_expenses, 0)
    }

    fn retirement_percent(&self) -> f64 {
        let contributions: f64 = in_category(&self.inputs.transactions, RETIREMENT)
            .filter(|t| t.amount > 0.0)
            .map(|t| t.amount)
            .sum();
        whole_percent(contributions, self.quarter.income)
    }

    fn debt_to_income_percent(&self) -> f64 {
        let payments: f64 = in_category(&self.inputs.transactions, DEBT_PAYMENT)
            .filter(|t| t.amount < 0.0)
            .map(|t| t.amount.abs())
            .sum();
        whole_percent(payments, self.month.income)
    }

    fn savings_card(&self, score: f64) -> HealthCategory {
        let fund = self.emergency_fund_months();
        let rate = whole_percent(self.quarter.savings(), self.quarter.income);
        let retirement = self.retirement_percent();
        card(
            "savings",
            "Savings",
            score,
            &[
                "Aim to save at least 20% of your monthly income",
                "Set up automatic transfers to your savings account",
                "Consider increasing your emergency fund to cover 6 months of expenses",
            ],
            vec![
                number_metric("Emergency Fund", fund, 6.0, "months", fund >= 6.0),
                number_metric("Savings Rate", rate, 20.0, "percent", rate >= 20.0),
                number_metric(
                    "Retirement Contributions",
                    retirement,
                    15.0,
                    "percent",
                    retirement >= 15.0,
                ),
            ],
        )
    }

    fn debt_card(&self, score: f64) -> HealthCategory {
        let ratio = self.debt_to_income_percent();
        card(
            "debt",
            "Debt Management",
            score,
            &[
                "Focus on paying off high-interest debt first",
                "Consider consolidating your credit card debt",
                "Keep your credit utilization below 30%",
            ],
            vec![
                number_metric("Debt-to-Income Ratio", ratio, 36.0, "percent", ratio <= 36.0),
                number_metric("Credit Utilization", CREDIT_UTILIZATION, 30.0, "percent", true),
            ],
        )
    }
}

fn number_metric(
    name: &'static str,
    value: f64,
    target: f64,
    unit: &'static str,
    good: bool,
) -> HealthMetric {
    HealthMetric {
        name,
        value: MetricValue::Number(value),
        target: MetricValue::Number(target),
        unit,
        status: MetricStatus::from_good(good),
    }
}

fn card(
    id: &'static str,
    name: &'static str,
    score: f64,
    recommendations: &[&'static str],
    metrics: Vec<HealthMetric>,
) -> HealthCategory {
    HealthCategory {
        id,
        name,
        score: round_half_ceil(score, 1),
        recommendations: if score < RECOMMEND_BELOW {
            recommendations.to_vec()
        } else {
            Vec::new()
        },
        metrics,
    }
}

fn spending_card(score: f64) -> HealthCategory {
    card(
        "spending",
        "Spending Habits",
        score,
        &[
            "Track your discretionary spending more closely",
            "Look for subscriptions or services you can cancel",
        ],
        vec![number_metric(
            "Budget Adherence",
            round_half_ceil(score, 0),
            90.0,
            "percent",
            score >= 85.0,
        )],
    )
}

fn growth_card(score: f64) -> HealthCategory {
    let diversified = score >= 70.0;
    card(
        "growth",
        "Growth & Investments",
        score,
        &[
            "Consider diversifying your investment portfolio",
            "Review your asset allocation to ensure it matches your goals",
        ],
        vec![HealthMetric {
            name: "Investment Diversification",
            value: MetricValue::Label(if diversified { "Moderate" } else { "Low" }),
            target: MetricValue::Label("High"),
            unit: "",
            status: MetricStatus::from_good(diversified),
        }],
    )
}

/// Scores `inputs` as of `today`.
pub fn evaluate(inputs: &HealthInputs, today: NaiveDate) -> Result<HealthReport> {
    let scorer = Scorer::new(inputs, today)?;
    let savings = scorer.savings();
    let debt = scorer.debt();
    let spending = scorer.budget();
    let growth = scorer.investment();
    debug!(savings, debt, spending, growth, "Component health scores");

    let overall = round_half_ceil(
        savings * SAVINGS_WEIGHT
            + debt * DEBT_WEIGHT
            + spending * BUDGET_WEIGHT
            + growth * INVESTMENT_WEIGHT,
        1,
    );

    Ok(HealthReport {
        overall_score: overall,
        previous_score: PREVIOUS_SCORE,
        status: status_for(overall),
        last_updated: today,
        categories: vec![
            scorer.savings_card(savings),
            scorer.debt_card(debt),
            spending_card(spending),
            growth_card(growth),
        ],
    })
}

/// Loads the user's data and scores it as of `today`.
#[instrument(skip(db))]
pub async fn health_score(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
) -> Result<HealthReport> {
    let inputs = HealthInputs {
        transactions: tx::all_for_user(db, user_id).await?,
        budgets: budget::list_budgets(db, user_id).await?,
        goals: goal::list_goals(db, user_id).await?,
    };
    evaluate(&inputs, today)
}

/// Month-by-month score trail ending with the current month.
///
/// No scores are stored, so the trail is a steady climb from 65.
pub fn history(today: NaiveDate, months: u32) -> Result<Vec<HistoryPoint>> {
    (0..months)
        .rev()
        .map(|i| {
            let date = period::shift_months(today, -i32::try_from(i)?)?;
            Ok(HistoryPoint {
                month: period::month_label(date),
                score: round_half_ceil(65.0 + f64::from(months - i) * 2.5, 1),
            })
        })
        .collect()
}

/// What each score card measures.
#[must_use]
pub fn categories() -> Vec<CategoryInfo> {
    vec![
        CategoryInfo {
            id: "savings",
            name: "Savings",
            description: "How well you're saving for emergencies and future goals",
            metrics: ["Emergency Fund", "Savings Rate", "Retirement Contributions"],
        },
        CategoryInfo {
            id: "debt",
            name: "Debt Management",
            description: "How effectively you're managing and reducing your debt",
            metrics: ["Debt-to-Income Ratio", "Credit Utilization", "Debt Payment Coverage"],
        },
        CategoryInfo {
            id: "spending",
            name: "Spending Habits",
            description: "How well you're managing your budget and spending",
            metrics: ["Budget Adherence", "Essential Expenses Ratio", "Discretionary Spending"],
        },
        CategoryInfo {
            id: "growth",
            name: "Growth & Investments",
            description: "How your investments are performing and diversified",
            metrics: ["Investment Diversification", "Investment Return", "Tax Efficiency"],
        },
    ]
}

/// Accepts a JSON object of health goals and echoes it back.
pub fn update_goals(goals: serde_json::Value) -> Result<GoalsUpdate> {
    if !goals.is_object() {
        return Err(Error::validation("Health goals must be a JSON object"));
    }
    Ok(GoalsUpdate {
        success: true,
        message: "Financial health goals updated successfully",
        goals,
        updated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        date(2025, 6, 30)
    }

    fn budget_model(category: &str, amount: f64, start: NaiveDate) -> budget_entity::Model {
        budget_entity::Model {
            id: 1,
            category: category.to_string(),
            amount,
            period: "monthly".to_string(),
            start_date: start,
            end_date: None,
            notes: None,
            created_by: 1,
        }
    }

    fn goal_model(category: &str, current: f64, target: f64) -> financial_goal::Model {
        financial_goal::Model {
            id: 1,
            name: category.to_string(),
            target_amount: target,
            current_amount: current,
            category: category.to_string(),
            start_date: date(2025, 1, 1),
            target_date: date(2026, 1, 1),
            priority: "High".to_string(),
            notes: None,
            created_by: 1,
        }
    }

    #[test]
    fn test_empty_inputs_use_neutral_scores() {
        let report = evaluate(&HealthInputs::default(), today()).unwrap();
        // 50*0.3 + 50*0.3 + 50*0.25 + 40*0.15
        assert_eq!(report.overall_score, 48.5);
        assert_eq!(report.status, "Needs Attention");
        assert_eq!(report.previous_score, 68.0);
        assert_eq!(report.last_updated, today());

        let ids: Vec<&str> = report.categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["savings", "debt", "spending", "growth"]);
        assert_eq!(report.categories[0].recommendations.len(), 3);
        assert_eq!(report.categories[3].metrics[0].value, MetricValue::Label("Low"));
    }

    #[test]
    fn test_healthy_household_scores_excellent() {
        let inputs = HealthInputs {
            transactions: vec![
                tx_model(date(2025, 6, 1), 5000.0, Some("Salary")),
                tx_model(date(2025, 6, 2), -2000.0, Some("Housing")),
                tx_model(date(2025, 6, 3), -200.0, Some("Food")),
                tx_model(date(2025, 6, 10), 500.0, Some("Retirement")),
            ],
            budgets: vec![budget_model("Food", 400.0, date(2025, 6, 1))],
            goals: vec![goal_model(INVESTMENT, 500.0, 1000.0)],
        };
        let report = evaluate(&inputs, today()).unwrap();

        // Savings rate (5500-2200)/5500 = 60% -> capped at 100
        assert_eq!(report.categories[0].score, 100.0);
        assert!(report.categories[0].recommendations.is_empty());
        // No debt payments
        assert_eq!(report.categories[1].score, 100.0);
        assert_eq!(report.categories[2].score, 100.0);
        // Goal progress 50 only
        assert_eq!(report.categories[3].score, round_half_ceil(50.0 / 3.0, 1));
        assert_eq!(report.status, "Excellent");

        let savings_metrics = &report.categories[0].metrics;
        assert_eq!(savings_metrics[1].value, MetricValue::Number(60.0));
        assert_eq!(savings_metrics[2].value, MetricValue::Number(9.0));
        assert_eq!(savings_metrics[2].status, MetricStatus::Warning);
    }

    #[test]
    fn test_overspent_budget_loses_points() {
        let inputs = HealthInputs {
            transactions: vec![tx_model(date(2025, 6, 3), -500.0, Some("Food"))],
            budgets: vec![budget_model("Food", 400.0, date(2025, 6, 1))],
            goals: Vec::new(),
        };
        let scorer = Scorer::new(&inputs, today()).unwrap();
        assert_eq!(scorer.budget(), 75.0);
    }

    #[test]
    fn test_debt_score_and_ratio() {
        let inputs = HealthInputs {
            transactions: vec![
                tx_model(date(2025, 6, 1), 4000.0, Some("Salary")),
                tx_model(date(2025, 6, 5), -800.0, Some(DEBT_PAYMENT)),
            ],
            ..Default::default()
        };
        let scorer = Scorer::new(&inputs, today()).unwrap();
        assert_eq!(scorer.debt(), 60.0);
        assert_eq!(scorer.debt_to_income_percent(), 20.0);
    }

    #[test]
    fn test_investment_diversity_without_goals() {
        let inputs = HealthInputs {
            transactions: vec![
                tx_model(date(2025, 1, 1), 100.0, Some(INVESTMENT)),
                tx_model(date(2025, 2, 1), 100.0, Some(INVESTMENT)),
            ],
            ..Default::default()
        };
        let scorer = Scorer::new(&inputs, today()).unwrap();
        // Both rows share the helper's description
        assert_eq!(scorer.investment(), (20.0 + 20.0) / 2.0);
    }

    #[test]
    fn test_emergency_fund_months() {
        let inputs = HealthInputs {
            transactions: vec![
                tx_model(date(2025, 5, 1), -3000.0, Some("Housing")),
                tx_model(date(2025, 2, 1), 2000.0, Some(SAVINGS)),
            ],
            goals: vec![goal_model(EMERGENCY_FUND, 4000.0, 10000.0)],
            ..Default::default()
        };
        let scorer = Scorer::new(&inputs, today()).unwrap();
        // 6000 / 1000 per month
        assert_eq!(scorer.emergency_fund_months(), 6.0);
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(status_for(80.0), "Excellent");
        assert_eq!(status_for(79.9), "Good");
        assert_eq!(status_for(60.0), "Fair");
        assert_eq!(status_for(59.9), "Needs Attention");
    }

    #[test]
    fn test_history_climbs() {
        let points = history(today(), 3).unwrap();
        assert_eq!(
            points,
            vec![
                HistoryPoint { month: "Apr 2025".to_string(), score: 67.5 },
                HistoryPoint { month: "May 2025".to_string(), score: 70.0 },
                HistoryPoint { month: "Jun 2025".to_string(), score: 72.5 },
            ]
        );
        assert!(history(today(), 0).unwrap().is_empty());
    }

    #[test]
    fn test_update_goals_requires_object() {
        let ack = update_goals(serde_json::json!({"savingsRate": 25})).unwrap();
        assert!(ack.success);
        assert_eq!(ack.goals["savingsRate"], 25);
        assert!(matches!(
            update_goals(serde_json::json!([1, 2])).unwrap_err(),
            Error::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn test_health_score_from_database() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        create_tx(&db, user.id, date(2025, 6, 1), 1000.0, "Pay", Some("Salary")).await?;
        create_tx(&db, user.id, date(2025, 6, 2), -900.0, "Rent", Some("Housing")).await?;

        let report = health_score(&db, user.id, today()).await?;
        // Savings rate 10% -> 50
        assert_eq!(report.categories[0].score, 50.0);
        assert_eq!(categories().len(), report.categories.len());
        Ok(())
    }
}
