//! Savings goal commands.

use crate::{
    cli::{AppContext, Output, clearable, today},
    core::{
        goal::{self, GoalChanges, NewGoal},
        money::{format_amount, format_progress_bar},
    },
    entities::{financial_goal, user},
    errors::Result,
};
use chrono::NaiveDate;
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum GoalCommand {
    /// Create a savings goal
    Add {
        name: String,
        target: f64,
        target_date: NaiveDate,
        #[arg(long, default_value = "Savings")]
        category: String,
        #[arg(long, default_value = "Medium")]
        priority: String,
        /// Amount already saved
        #[arg(long)]
        current: Option<f64>,
        /// Defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List goals, highest priority first
    List,
    /// Show one goal
    Show { id: i64 },
    /// Change fields of a goal
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long)]
        current: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        target_date: Option<NaiveDate>,
        #[arg(long)]
        priority: Option<String>,
        /// Empty text clears the notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a goal
    Delete { id: i64 },
    /// Add money to a goal
    Contribute { id: i64, amount: f64 },
    /// Progress towards a goal as of today
    Progress { id: i64 },
}

fn goal_line(g: &financial_goal::Model) -> String {
    let progress = crate::core::money::calculate_progress(g.current_amount, g.target_amount);
    format!(
        "#{:<4} {:<20} {} {} / {}  by {} [{}]",
        g.id,
        g.name,
        format_progress_bar(progress, Some(10)),
        format_amount(g.current_amount),
        format_amount(g.target_amount),
        g.target_date,
        g.priority,
    )
}

pub async fn run(ctx: &AppContext, user: &user::Model, command: GoalCommand, out: Output) -> Result<()> {
    let db = &ctx.database;

    match command {
        GoalCommand::Add {
            name,
            target,
            target_date,
            category,
            priority,
            current,
            start,
            notes,
        } => {
            let input = NewGoal {
                name,
                target_amount: target,
                current_amount: current,
                category,
                start_date: start.unwrap_or_else(today),
                target_date,
                priority,
                notes,
            };
            let created = goal::create_goal(db, user.id, input).await?;
            out.emit(&created, |g| format!("🎯 Created goal\n{}", goal_line(g)))
        }
        GoalCommand::List => {
            let goals = goal::list_goals(db, user.id).await?;
            out.emit(&goals, |goals| {
                if goals.is_empty() {
                    return "📭 No goals yet. Create one with `goal add`.".to_string();
                }
                goals.iter().map(goal_line).collect::<Vec<_>>().join("\n")
            })
        }
        GoalCommand::Show { id } => {
            let found = goal::get_goal(db, user.id, id).await?;
            out.emit(&found, |g| {
                format!(
                    "{}\nCategory: {}\nStarted: {}\nNotes: {}",
                    goal_line(g),
                    g.category,
                    g.start_date,
                    g.notes.as_deref().unwrap_or("-"),
                )
            })
        }
        GoalCommand::Update {
            id,
            name,
            target,
            current,
            category,
            start,
            target_date,
            priority,
            notes,
        } => {
            let changes = GoalChanges {
                name,
                target_amount: target,
                current_amount: current,
                category,
                start_date: start,
                target_date,
                priority,
                notes: clearable(notes),
            };
            let updated = goal::update_goal(db, user.id, id, changes).await?;
            out.emit(&updated, |g| format!("✅ Updated goal\n{}", goal_line(g)))
        }
        GoalCommand::Delete { id } => {
            goal::delete_goal(db, user.id, id).await?;
            out.success(&format!("Deleted goal #{id}"))
        }
        GoalCommand::Contribute { id, amount } => {
            let updated = goal::add_contribution(db, user.id, id, amount).await?;
            out.emit(&updated, |g| {
                format!("💰 Added {} to goal\n{}", format_amount(amount), goal_line(g))
            })
        }
        GoalCommand::Progress { id } => {
            let progress = goal::progress(db, user.id, id, today()).await?;
            out.emit(&progress, |p| {
                format!(
                    "🎯 {}: {:.1}% complete, {} to go, {} days left",
                    p.name,
                    p.progress_percentage,
                    format_amount(p.remaining_amount),
                    p.days_remaining,
                )
            })
        }
    }
}
