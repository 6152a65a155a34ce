//! Category lists offered when recording transactions.

use serde::Serialize;
use std::collections::BTreeSet;

/// Income categories every user starts with.
pub const DEFAULT_INCOME_CATEGORIES: [&str; 4] = ["Salary", "Investments", "Gifts", "Other Income"];

/// Expense categories every user starts with.
pub const DEFAULT_EXPENSE_CATEGORIES: [&str; 9] = [
    "Housing",
    "Food",
    "Transportation",
    "Entertainment",
    "Utilities",
    "Healthcare",
    "Education",
    "Shopping",
    "Other Expenses",
];

/// The flat catalogue shown when picking a category for any record.
pub const CATEGORY_CATALOGUE: [&str; 13] = [
    "Housing",
    "Food",
    "Transportation",
    "Entertainment",
    "Utilities",
    "Healthcare",
    "Education",
    "Shopping",
    "Personal",
    "Salary",
    "Investments",
    "Gifts",
    "Other",
];

/// Income and expense categories, each sorted and free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryLists {
    pub income: Vec<String>,
    pub expense: Vec<String>,
}

/// Merges the defaults with categories seen on the user's own transactions.
///
/// Blank names are dropped.
#[must_use]
pub fn merge_with_defaults(
    used_income: impl IntoIterator<Item = String>,
    used_expense: impl IntoIterator<Item = String>,
) -> CategoryLists {
    fn merge(defaults: &[&str], used: impl IntoIterator<Item = String>) -> Vec<String> {
        defaults
            .iter()
            .map(|c| (*c).to_string())
            .chain(used)
            .filter(|c| !c.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    CategoryLists {
        income: merge(&DEFAULT_INCOME_CATEGORIES, used_income),
        expense: merge(&DEFAULT_EXPENSE_CATEGORIES, used_expense),
    }
}

/// The catalogue as owned strings.
#[must_use]
pub fn catalogue() -> Vec<String> {
    CATEGORY_CATALOGUE.iter().map(|c| (*c).to_string()).collect()
}

/// The catalogue with `name` appended when it is new and not blank.
///
/// Nothing is stored; the caller decides what to do with the list.
#[must_use]
pub fn with_added(name: &str) -> Vec<String> {
    let mut categories = catalogue();
    let name = name.trim();
    if !name.is_empty() && !categories.iter().any(|c| c == name) {
        categories.push(name.to_string());
    }
    categories
}
