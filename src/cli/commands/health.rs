//! Financial health commands.

use crate::{
    cli::{AppContext, Output, today},
    core::health,
    entities::user,
    errors::Result,
};
use clap::Subcommand;
use std::fmt::Write;

#[derive(Debug, Subcommand)]
pub enum HealthCommand {
    /// Overall score with per-area score cards
    Score,
    /// Score trail for recent months
    History {
        #[arg(long, default_value = "6")]
        months: u32,
    },
    /// What each score card measures
    Categories,
    /// Submit health goals as a JSON object
    Goals {
        /// JSON object such as {"emergency_fund_months": 6}
        goals: String,
    },
}

pub async fn run(
    ctx: &AppContext,
    user: &user::Model,
    command: HealthCommand,
    out: Output,
) -> Result<()> {
    match command {
        HealthCommand::Score => {
            let report = health::health_score(&ctx.database, user.id, today()).await?;
            out.emit(&report, |r| {
                let mut text = format!(
                    "❤️ Financial health: {:.1} ({}), previously {:.1}\n",
                    r.overall_score, r.status, r.previous_score
                );
                for card in &r.categories {
                    let _ = writeln!(text, "\n{} {:.1}", card.name, card.score);
                    for metric in &card.metrics {
                        let _ = writeln!(
                            text,
                            "  {:<28} {}{} (target {}{}) {:?}",
                            metric.name,
                            metric.value,
                            metric.unit,
                            metric.target,
                            metric.unit,
                            metric.status,
                        );
                    }
                    for tip in &card.recommendations {
                        let _ = writeln!(text, "  💡 {tip}");
                    }
                }
                text.trim_end().to_string()
            })
        }
        HealthCommand::History { months } => {
            let points = health::history(today(), months)?;
            out.emit(&points, |points| {
                points
                    .iter()
                    .map(|p| format!("{:<9} {:>5.1}", p.month, p.score))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        HealthCommand::Categories => {
            let catalogue = health::categories();
            out.emit(&catalogue, |cards| {
                cards
                    .iter()
                    .map(|c| format!("{} ({})\n  {}\n  {}", c.name, c.id, c.description, c.metrics.join(", ")))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        HealthCommand::Goals { goals } => {
            let goals = serde_json::from_str(&goals)?;
            let ack = health::update_goals(goals)?;
            out.emit(&ack, |a| format!("✅ {}", a.message))
        }
    }
}
