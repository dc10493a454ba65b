//! Domain error types.

use crate::domain::price::Instrument;
use chrono::NaiveDate;
use std::fmt;

/// Pipeline stage in which a simulation defect surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MovingAverage,
    Signal,
    Initialization,
    Rebalance,
    HoldingUpdate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::MovingAverage => "moving average",
            Stage::Signal => "signal",
            Stage::Initialization => "initialization",
            Stage::Rebalance => "rebalance",
            Stage::HoldingUpdate => "holding update",
        };
        f.write_str(name)
    }
}

/// Top-level error type for rebalancer.
#[derive(Debug, thiserror::Error)]
pub enum RebalancerError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to read price data: {reason}")]
    DataRead { reason: String },

    #[error("dates not strictly increasing at row {index}: {current} follows {previous}")]
    NonMonotonicDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("non-positive {instrument} price {value} on {date}")]
    NonPositivePrice {
        date: NaiveDate,
        instrument: Instrument,
        value: f64,
    },

    #[error("insufficient data: have {bars} rows, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("{stage} failed for {instrument} on {date}: {reason}")]
    Simulation {
        date: NaiveDate,
        instrument: Instrument,
        stage: Stage,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RebalancerError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        RebalancerError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error class.
    pub fn exit_status(&self) -> u8 {
        match self {
            RebalancerError::Io(_) | RebalancerError::Report { .. } => 1,
            RebalancerError::ConfigParse { .. }
            | RebalancerError::ConfigMissing { .. }
            | RebalancerError::ConfigInvalid { .. } => 2,
            RebalancerError::DataRead { .. }
            | RebalancerError::NonMonotonicDates { .. }
            | RebalancerError::NonPositivePrice { .. }
            | RebalancerError::InsufficientData { .. } => 3,
            RebalancerError::Simulation { .. } => 4,
        }
    }
}

impl From<&RebalancerError> for std::process::ExitCode {
    fn from(err: &RebalancerError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
