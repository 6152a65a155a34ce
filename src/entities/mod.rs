//! Entity module - Contains all SeaORM entity definitions for the database.
//! Relational records (users, transactions, budgets, goals, import jobs, reports)
//! live beside two JSON document tables (analytics results, raw import snapshots).

pub mod analytics_result;
pub mod budget;
pub mod financial_goal;
pub mod import_job;
pub mod raw_import_data;
pub mod report;
pub mod transaction;
pub mod user;

// Re-export specific types to avoid conflicts
pub use analytics_result::{
    Column as AnalyticsResultColumn, Entity as AnalyticsResult, Model as AnalyticsResultModel,
};
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use financial_goal::{
    Column as FinancialGoalColumn, Entity as FinancialGoal, Model as FinancialGoalModel,
};
pub use import_job::{Column as ImportJobColumn, Entity as ImportJob, Model as ImportJobModel};
pub use raw_import_data::{
    Column as RawImportDataColumn, Entity as RawImportData, Model as RawImportDataModel,
};
pub use report::{Column as ReportColumn, Entity as Report, Model as ReportModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
