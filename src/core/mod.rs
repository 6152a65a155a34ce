/// Period summaries, category breakdowns and trends, with a stored result history
pub mod analytics;
/// Registration, login and access tokens
pub mod auth;
/// Category spending caps and their monthly progress
pub mod budget;
/// Default and in-use category names
pub mod category;
/// Dashboard widgets
pub mod dashboard;
/// Cash flow, income, expense and savings projections
pub mod forecast;
/// Savings goals and contributions
pub mod goal;
/// Financial health score and its score cards
pub mod health;
/// CSV import jobs and raw snapshots
pub mod import;
/// Rounding, totals and amount formatting
pub mod money;
/// Calendar month and look-back window helpers
pub mod period;
/// Saved report definitions, generation and export
pub mod report;
/// Transaction records and shared queries
pub mod transaction;
