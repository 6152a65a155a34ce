/// `analytics` - summaries, breakdowns, trends and result history
pub mod analytics;
/// `auth` - register, login, logout and the current user
pub mod auth;
/// `budget` - budget records and monthly progress
pub mod budget;
/// `dashboard` - headline widgets
pub mod dashboard;
/// `forecast` - projections
pub mod forecast;
/// `goal` - savings goals and contributions
pub mod goal;
/// `health` - financial health score
pub mod health;
/// `import` - CSV import jobs
pub mod import;
/// `report` - saved reports, generation and export
pub mod report;
/// `status` - database connectivity check
pub mod status;
/// `tx` - transaction records and categories
pub mod transaction;
