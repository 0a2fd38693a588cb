//! Shared utilities for ledger crates.
//!
//! Every fallible pipeline step (CSV read, header normalization, coercion,
//! batch build, warehouse append) runs through a [`RetryPolicy`]. Errors opt
//! into retries by implementing [`Retryable`]; anything classified as
//! permanent fails on the first attempt.

pub mod retry;

pub use retry::{RetryPolicy, Retryable, Sleeper, no_sleep};
