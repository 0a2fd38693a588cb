//! CLI library components for `ledger-load`.

pub mod config;
pub mod envelope;
pub mod logging;
pub mod pipeline;
