//! Watches a Telegram chat for keywords and forwards new matches to one account.

pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod matcher;
pub mod platform;
pub mod poller;
pub mod scheduler;
pub mod store;
