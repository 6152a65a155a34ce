//! Output formatting shared by the commands.

use crate::{
    core::money::{format_amount, format_signed_amount},
    entities::transaction,
    errors::Result,
};
use serde::Serialize;
use std::fmt::Write;

/// Where command results go: pretty JSON, or text built by the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    json: bool,
}

impl Output {
    #[must_use]
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    /// Prints `value` as JSON, or the text `human` renders from it.
    pub fn emit<T: Serialize + ?Sized>(self, value: &T, human: impl FnOnce(&T) -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human(value));
        }
        Ok(())
    }

    /// Prints a one-line confirmation, or `{"success": true, "message": ...}` as JSON.
    pub fn success(self, message: &str) -> Result<()> {
        self.emit(
            &serde_json::json!({ "success": true, "message": message }),
            |_| format!("✅ {message}"),
        )
    }
}

/// One line per transaction: id, date, signed amount, description and category.
#[must_use]
pub fn transaction_lines(rows: &[transaction::Model]) -> String {
    if rows.is_empty() {
        return "📭 No transactions found.".to_string();
    }
    let mut text = String::new();
    for t in rows {
        let _ = writeln!(
            text,
            "#{:<5} {}  {:>12}  {}{}",
            t.id,
            t.date,
            format_signed_amount(t.amount),
            t.description,
            t.category
                .as_deref()
                .map(|c| format!(" [{c}]"))
                .unwrap_or_default(),
        );
    }
    text.trim_end().to_string()
}

/// `label: $1,234.56`-style line.
#[must_use]
pub fn money_line(label: &str, amount: f64) -> String {
    format!("{label}: {}", format_amount(amount))
}
