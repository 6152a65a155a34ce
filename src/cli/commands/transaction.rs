//! Transaction commands - record, browse, edit and categorise money movements.

use crate::{
    cli::{
        AppContext, Output,
        output::{money_line, transaction_lines},
        today,
    },
    core::{
        category,
        money::{expense_total, income_total},
        transaction::{self as tx, NewTransaction, TransactionChanges, TransactionFilter},
    },
    entities::user,
    errors::Result,
};
use chrono::NaiveDate;
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum TxCommand {
    /// Record a transaction; negative amounts are expenses
    Add {
        #[arg(allow_hyphen_values = true)]
        amount: f64,
        description: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long, default_value_t = false)]
        reconciled: bool,
    },
    /// List transactions, newest first
    List {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        category: Option<String>,
        /// income or expense
        #[arg(long)]
        kind: Option<String>,
    },
    /// Show one transaction
    Show { id: i64 },
    /// Change fields of a transaction
    Update {
        id: i64,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<f64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        reconciled: Option<bool>,
    },
    /// Delete a transaction
    Delete { id: i64 },
    /// Income and expense categories in use, merged with the defaults
    Categories,
    /// The standard category catalogue
    Catalogue {
        /// Show the catalogue with this category appended
        #[arg(long)]
        add: Option<String>,
    },
}

pub async fn run(ctx: &AppContext, user: &user::Model, command: TxCommand, out: Output) -> Result<()> {
    let db = &ctx.database;

    match command {
        TxCommand::Add {
            amount,
            description,
            date,
            category,
            account,
            reconciled,
        } => {
            let input = NewTransaction {
                date: date.unwrap_or_else(today),
                description,
                amount,
                category,
                account,
                is_reconciled: reconciled,
            };
            let created = tx::create_transaction(db, user.id, input).await?;
            out.emit(&created, |t| {
                format!("✅ Recorded transaction #{}\n{}", t.id, transaction_lines(std::slice::from_ref(t)))
            })
        }
        TxCommand::List {
            start,
            end,
            category,
            kind,
        } => {
            let filter = TransactionFilter {
                start,
                end,
                category,
                kind: kind.as_deref().map(str::parse).transpose()?,
            };
            let rows = tx::list_transactions(db, user.id, &filter).await?;
            out.emit(&rows, |rows| {
                let amounts: Vec<f64> = rows.iter().map(|t| t.amount).collect();
                format!(
                    "{}\n\n{} | {}",
                    transaction_lines(rows),
                    money_line("Income", income_total(&amounts)),
                    money_line("Expenses", expense_total(&amounts)),
                )
            })
        }
        TxCommand::Show { id } => {
            let found = tx::get_transaction(db, user.id, id).await?;
            out.emit(&found, |t| {
                format!(
                    "{}\nType: {}\nAccount: {}\nReconciled: {}",
                    transaction_lines(std::slice::from_ref(t)),
                    t.transaction_type,
                    t.account.as_deref().unwrap_or(tx::DEFAULT_ACCOUNT),
                    if t.is_reconciled { "yes" } else { "no" },
                )
            })
        }
        TxCommand::Update {
            id,
            amount,
            description,
            date,
            category,
            account,
            reconciled,
        } => {
            let changes = TransactionChanges {
                date,
                description,
                amount,
                category,
                account,
                is_reconciled: reconciled,
            };
            let updated = tx::update_transaction(db, user.id, id, changes).await?;
            out.emit(&updated, |t| format!("✅ Updated transaction #{}", t.id))
        }
        TxCommand::Delete { id } => {
            tx::delete_transaction(db, user.id, id).await?;
            out.success(&format!("Deleted transaction #{id}"))
        }
        TxCommand::Categories => {
            let lists = tx::categories(db, user.id).await?;
            out.emit(&lists, |l| {
                format!(
                    "💰 Income: {}\n💸 Expense: {}",
                    l.income.join(", "),
                    l.expense.join(", ")
                )
            })
        }
        TxCommand::Catalogue { add } => {
            let list = add.as_deref().map_or_else(category::catalogue, category::with_added);
            out.emit(&list, |l| l.join("\n"))
        }
    }
}
