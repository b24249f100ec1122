pub mod activity_log;
pub mod app_user;
pub mod ledger_entry;
pub mod ledger_log;
pub mod senior;
