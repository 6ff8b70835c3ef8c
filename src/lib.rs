pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod humanize;
pub mod ledger;
pub mod observability;
pub mod shortener;
pub mod storage;
