pub mod accounts;
pub mod portfolio_records;
