pub mod env;
mod export;
pub mod lido_api;
pub mod log;
pub mod report;
pub mod tax_year;
pub mod units;

pub use export::export_rewards_report;
pub use export::ExportParams;
pub use export::ExportSummary;
