//! Core domain types and logic.

pub mod price;
pub mod price_history;
pub mod indicator;
pub mod moving_average;
pub mod signal;
pub mod portfolio;
pub mod backtest;
pub mod config_validation;
pub mod metrics;
pub mod error;
