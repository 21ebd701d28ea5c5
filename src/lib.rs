pub mod args;
pub mod categorize;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod export;
pub mod import;
pub mod rules;
pub mod sanitize;
pub mod shortcuts;
pub mod stage;
pub mod terminal;
pub mod transaction;
