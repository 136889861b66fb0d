pub mod charts;
pub mod config;
pub mod csrf;
pub mod db;
pub mod error;
pub mod filter;
pub mod form_utils;
pub mod format;
pub mod handlers;
pub mod models;
pub mod state;

/// Application version from Cargo.toml (single source of truth)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
