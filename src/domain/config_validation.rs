//! Configuration and input validation.
//!
//! Runs before any simulation work so that malformed parameters or data surface
//! as config/data errors rather than as simulation failures.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::RebalancerError;
use crate::domain::price_history::PriceHistory;

/// Beyond this many decimals an f64 ratio has no digits left to round.
pub const MAX_RATIO_PRECISION: u32 = 15;

pub fn validate_config(config: &BacktestConfig) -> Result<(), RebalancerError> {
    validate_starting_value(config)?;
    validate_allocation(config)?;
    validate_charges(config)?;
    validate_windows(config)?;
    validate_ratio_band(config)?;
    validate_ratio_precision(config)?;
    validate_transfer_shares(config)?;
    Ok(())
}

/// Checks the history against the configuration. A history shorter than the
/// long window is a data error; a cooldown longer than the history is a
/// configuration error. Ordering and price positivity are enforced when the
/// history is built.
pub fn validate_history(
    history: &PriceHistory,
    config: &BacktestConfig,
) -> Result<(), RebalancerError> {
    let minimum = config.min_rows();
    if history.len() < minimum {
        return Err(RebalancerError::InsufficientData {
            bars: history.len(),
            minimum,
        });
    }
    if config.min_rebalance_gap > history.len() {
        return Err(RebalancerError::invalid(
            "signals",
            "min_rebalance_gap",
            format!(
                "min_rebalance_gap ({}) is longer than the price history ({} rows)",
                config.min_rebalance_gap,
                history.len()
            ),
        ));
    }
    Ok(())
}

fn validate_starting_value(config: &BacktestConfig) -> Result<(), RebalancerError> {
    if !(config.starting_value.is_finite() && config.starting_value > 0.0) {
        return Err(RebalancerError::invalid(
            "backtest",
            "starting_value",
            "starting_value must be positive",
        ));
    }
    Ok(())
}

fn validate_allocation(config: &BacktestConfig) -> Result<(), RebalancerError> {
    check_unit_interval("backtest", "starting_equity_share", config.starting_equity_share)?;
    check_unit_interval("backtest", "starting_bond_share", config.starting_bond_share)?;
    if config.starting_equity_share + config.starting_bond_share > 1.0 + 1e-12 {
        return Err(RebalancerError::invalid(
            "backtest",
            "starting_bond_share",
            "starting shares must not sum to more than 1",
        ));
    }
    Ok(())
}

fn validate_charges(config: &BacktestConfig) -> Result<(), RebalancerError> {
    for (key, value) in [
        ("equity_charge", config.equity_charge),
        ("bond_charge", config.bond_charge),
    ] {
        if !(value.is_finite() && (0.0..1.0).contains(&value)) {
            return Err(RebalancerError::invalid(
                "backtest",
                key,
                format!("{} must be in [0, 1)", key),
            ));
        }
    }
    Ok(())
}

fn validate_windows(config: &BacktestConfig) -> Result<(), RebalancerError> {
    if config.short_window == 0 {
        return Err(RebalancerError::invalid(
            "signals",
            "short_window",
            "short_window must be at least 1",
        ));
    }
    if config.long_window == 0 {
        return Err(RebalancerError::invalid(
            "signals",
            "long_window",
            "long_window must be at least 1",
        ));
    }
    Ok(())
}

fn validate_ratio_band(config: &BacktestConfig) -> Result<(), RebalancerError> {
    if !(config.ratio_bound_scale.is_finite() && config.ratio_bound_scale > 0.0) {
        return Err(RebalancerError::invalid(
            "signals",
            "ratio_bound_scale",
            "ratio_bound_scale must be positive",
        ));
    }
    if !(config.ratio_lower_bound.is_finite() && config.ratio_lower_bound > 0.0) {
        return Err(RebalancerError::invalid(
            "signals",
            "ratio_lower_bound",
            "ratio_lower_bound must be positive",
        ));
    }
    if !(config.ratio_upper_bound.is_finite()
        && config.ratio_upper_bound > config.ratio_lower_bound)
    {
        return Err(RebalancerError::invalid(
            "signals",
            "ratio_upper_bound",
            "ratio_upper_bound must be greater than ratio_lower_bound",
        ));
    }
    Ok(())
}

fn validate_ratio_precision(config: &BacktestConfig) -> Result<(), RebalancerError> {
    if config.ratio_precision > MAX_RATIO_PRECISION {
        return Err(RebalancerError::invalid(
            "signals",
            "ratio_precision",
            format!("ratio_precision must be at most {}", MAX_RATIO_PRECISION),
        ));
    }
    Ok(())
}

fn validate_transfer_shares(config: &BacktestConfig) -> Result<(), RebalancerError> {
    let shares = &config.shares;
    check_unit_interval(
        "rebalance",
        "share_bond_sold_on_equity_buy",
        shares.bond_sold_on_equity_buy,
    )?;
    check_unit_interval(
        "rebalance",
        "share_equity_sold_on_equity_sell",
        shares.equity_sold_on_equity_sell,
    )?;
    check_unit_interval(
        "rebalance",
        "share_bond_sold_on_bond_sell",
        shares.bond_sold_on_bond_sell,
    )?;
    check_unit_interval(
        "rebalance",
        "share_equity_sold_on_bond_buy",
        shares.equity_sold_on_bond_buy,
    )?;
    Ok(())
}

fn check_unit_interval(section: &str, key: &str, value: f64) -> Result<(), RebalancerError> {
    if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
        return Err(RebalancerError::invalid(
            section,
            key,
            format!("{} must be between 0 and 1", key),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PriceBar;
    use chrono::NaiveDate;

    fn assert_invalid_key(config: BacktestConfig, expected: &str) {
        match validate_config(&config) {
            Err(RebalancerError::ConfigInvalid { key, .. }) => assert_eq!(key, expected),
            other => panic!("expected ConfigInvalid for {}, got {:?}", expected, other),
        }
    }

    fn history_of(len: usize) -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let bars = (0..len)
            .map(|i| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                equity: 100.0,
                bond: 50.0,
            })
            .collect();
        PriceHistory::new(bars).unwrap()
    }

    #[test]
    fn default_config_passes() {
        assert!(validate_config(&BacktestConfig::default()).is_ok());
    }

    #[test]
    fn starting_value_must_be_positive() {
        assert_invalid_key(
            BacktestConfig {
                starting_value: 0.0,
                ..BacktestConfig::default()
            },
            "starting_value",
        );
    }

    #[test]
    fn allocation_shares_out_of_range_fail() {
        assert_invalid_key(
            BacktestConfig {
                starting_equity_share: -0.1,
                ..BacktestConfig::default()
            },
            "starting_equity_share",
        );
        assert_invalid_key(
            BacktestConfig {
                starting_equity_share: 0.9,
                starting_bond_share: 0.2,
                ..BacktestConfig::default()
            },
            "starting_bond_share",
        );
    }

    #[test]
    fn partial_allocation_is_allowed() {
        let config = BacktestConfig {
            starting_equity_share: 0.5,
            starting_bond_share: 0.3,
            ..BacktestConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn charge_of_one_fails() {
        assert_invalid_key(
            BacktestConfig {
                bond_charge: 1.0,
                ..BacktestConfig::default()
            },
            "bond_charge",
        );
    }

    #[test]
    fn zero_window_fails() {
        assert_invalid_key(
            BacktestConfig {
                short_window: 0,
                ..BacktestConfig::default()
            },
            "short_window",
        );
        assert_invalid_key(
            BacktestConfig {
                long_window: 0,
                ..BacktestConfig::default()
            },
            "long_window",
        );
    }

    #[test]
    fn inverted_band_fails() {
        assert_invalid_key(
            BacktestConfig {
                ratio_lower_bound: 0.7,
                ratio_upper_bound: 0.4,
                ..BacktestConfig::default()
            },
            "ratio_upper_bound",
        );
    }

    #[test]
    fn transfer_share_above_one_fails() {
        let mut config = BacktestConfig::default();
        config.shares.equity_sold_on_bond_buy = 1.5;
        assert_invalid_key(config, "share_equity_sold_on_bond_buy");
    }

    #[test]
    fn history_shorter_than_long_window_fails() {
        let err = validate_history(&history_of(199), &BacktestConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            RebalancerError::InsufficientData { bars: 199, minimum: 200 }
        ));
        assert!(validate_history(&history_of(200), &BacktestConfig::default()).is_ok());
    }

    #[test]
    fn gap_longer_than_history_is_config_error() {
        let config = BacktestConfig {
            short_window: 2,
            long_window: 3,
            min_rebalance_gap: 10,
            ..BacktestConfig::default()
        };
        let err = validate_history(&history_of(5), &config).unwrap_err();
        assert!(matches!(
            err,
            RebalancerError::ConfigInvalid { ref key, .. } if key == "min_rebalance_gap"
        ));
        assert_eq!(err.exit_status(), 2);

        assert!(validate_history(&history_of(10), &config).is_ok());
    }

    #[test]
    fn ratio_precision_above_limit_fails() {
        assert_invalid_key(
            BacktestConfig {
                ratio_precision: 400,
                ..BacktestConfig::default()
            },
            "ratio_precision",
        );
        let config = BacktestConfig {
            ratio_precision: MAX_RATIO_PRECISION,
            ..BacktestConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}
