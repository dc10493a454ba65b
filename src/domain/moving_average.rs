//! Per-date moving-average record for both instruments plus the price ratio.
//!
//! Records before the warm-up boundary are all-zero with `valid == false`. The
//! equity and bond pipelines depend only on their own price history, so they are
//! computed side by side.

use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::price::Instrument;
use crate::domain::price_history::PriceHistory;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovingAverages {
    pub short: f64,
    pub long: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageRecord {
    pub date: NaiveDate,
    pub valid: bool,
    pub equity: MovingAverages,
    pub bond: MovingAverages,
    pub ratio: f64,
}

/// Index of the first row on which both windows are fully populated.
pub fn warmup_index(short_window: usize, long_window: usize) -> usize {
    short_window.max(long_window).saturating_sub(1)
}

pub fn build_moving_averages(
    history: &PriceHistory,
    short_window: usize,
    long_window: usize,
    ratio_precision: u32,
) -> Vec<MovingAverageRecord> {
    let dates = history.dates();
    let warmup = warmup_index(short_window, long_window);

    let compute = |instrument: Instrument| -> (IndicatorSeries, IndicatorSeries) {
        let prices = history.prices(instrument);
        (
            calculate_sma(&dates, &prices, short_window),
            calculate_sma(&dates, &prices, long_window),
        )
    };
    let ((eq_short, eq_long), (bond_short, bond_long)) =
        rayon::join(|| compute(Instrument::Equity), || compute(Instrument::Bond));

    let pick = |series: &IndicatorSeries, i: usize| series.value_at(i).unwrap_or(0.0);

    history
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i < warmup {
                return MovingAverageRecord {
                    date: bar.date,
                    valid: false,
                    equity: MovingAverages::default(),
                    bond: MovingAverages::default(),
                    ratio: 0.0,
                };
            }
            MovingAverageRecord {
                date: bar.date,
                valid: true,
                equity: MovingAverages {
                    short: pick(&eq_short, i),
                    long: pick(&eq_long, i),
                },
                bond: MovingAverages {
                    short: pick(&bond_short, i),
                    long: pick(&bond_long, i),
                },
                ratio: bar.ratio(ratio_precision),
            }
        })
        .collect()
}
