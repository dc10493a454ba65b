//! Ordered, validated price history shared read-only by every stage.

use crate::domain::error::RebalancerError;
use crate::domain::price::{Instrument, PriceBar};
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct PriceHistory {
    bars: Vec<PriceBar>,
}

impl PriceHistory {
    /// Builds the history, rejecting non-increasing dates and non-positive prices.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, RebalancerError> {
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(RebalancerError::NonMonotonicDates {
                    index: i + 1,
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }

        for bar in &bars {
            for instrument in Instrument::ALL {
                let value = bar.price(instrument);
                if !(value.is_finite() && value > 0.0) {
                    return Err(RebalancerError::NonPositivePrice {
                        date: bar.date,
                        instrument,
                        value,
                    });
                }
            }
        }

        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> &PriceBar {
        &self.bars[index]
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn prices(&self, instrument: Instrument) -> Vec<f64> {
        self.bars.iter().map(|b| b.price(instrument)).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Date on which a trailing window of `window` rows is first fully populated.
    pub fn warmup_date(&self, window: usize) -> Option<NaiveDate> {
        if window == 0 {
            return None;
        }
        self.bars.get(window - 1).map(|b| b.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bar(date: &str, equity: f64, bond: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            equity,
            bond,
        }
    }

    #[test]
    fn new_keeps_rows_in_order() {
        let history = PriceHistory::new(vec![
            make_bar("2024-01-01", 100.0, 50.0),
            make_bar("2024-01-02", 101.0, 51.0),
            make_bar("2024-01-03", 102.0, 52.0),
        ])
        .unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history.bar(1).date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(
            history.last_date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
        );
        assert_eq!(history.prices(Instrument::Bond), vec![50.0, 51.0, 52.0]);
    }

    #[test]
    fn duplicate_date_is_rejected() {
        let err = PriceHistory::new(vec![
            make_bar("2024-01-01", 100.0, 50.0),
            make_bar("2024-01-02", 101.0, 51.0),
            make_bar("2024-01-02", 102.0, 52.0),
        ])
        .unwrap_err();

        assert!(matches!(err, RebalancerError::NonMonotonicDates { index: 2, .. }));
    }

    #[test]
    fn descending_dates_are_rejected() {
        let err = PriceHistory::new(vec![
            make_bar("2024-01-05", 100.0, 50.0),
            make_bar("2024-01-04", 101.0, 51.0),
        ])
        .unwrap_err();

        assert!(matches!(err, RebalancerError::NonMonotonicDates { index: 1, .. }));
    }

    #[test]
    fn zero_price_is_rejected() {
        let err = PriceHistory::new(vec![
            make_bar("2024-01-01", 100.0, 50.0),
            make_bar("2024-01-02", 101.0, 0.0),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            RebalancerError::NonPositivePrice { instrument: Instrument::Bond, .. }
        ));
    }

    #[test]
    fn nan_price_is_rejected() {
        let err = PriceHistory::new(vec![make_bar("2024-01-01", f64::NAN, 50.0)]).unwrap_err();
        assert!(matches!(
            err,
            RebalancerError::NonPositivePrice { instrument: Instrument::Equity, .. }
        ));
    }

    #[test]
    fn warmup_date_is_window_minus_one_rows_in() {
        let history = PriceHistory::new(vec![
            make_bar("2024-01-01", 100.0, 50.0),
            make_bar("2024-01-02", 101.0, 51.0),
            make_bar("2024-01-03", 102.0, 52.0),
        ])
        .unwrap();

        assert_eq!(
            history.warmup_date(3),
            Some(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
        );
        assert_eq!(history.warmup_date(4), None);
        assert_eq!(history.warmup_date(0), None);
    }

    #[test]
    fn empty_history_is_allowed() {
        let history = PriceHistory::new(vec![]).unwrap();
        assert!(history.is_empty());
        assert_eq!(history.first_date(), None);
        assert_eq!(history.last_date(), None);
    }
}
