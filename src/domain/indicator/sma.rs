//! Simple moving average.
//!
//! Full-series path: O(n) sliding recurrence
//! `mean[t] = mean[t-1] + (x[t] - x[t-w]) / w`, seeded with the explicit mean of
//! the first window. `RollingMean` runs the same recurrence one value at a time,
//! so both paths produce bit-identical output.
//! Warmup: first (w-1) rows are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use chrono::NaiveDate;
use std::collections::VecDeque;

pub fn calculate_sma(dates: &[NaiveDate], values: &[f64], period: usize) -> IndicatorSeries {
    debug_assert_eq!(dates.len(), values.len());

    if period == 0 || values.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Sma(period),
            values: Vec::new(),
        };
    }

    let mut points = Vec::with_capacity(values.len());
    let mut mean = 0.0;

    for (i, (&date, &x)) in dates.iter().zip(values).enumerate() {
        let valid = i + 1 >= period;
        if i + 1 == period {
            mean = values[..period].iter().sum::<f64>() / period as f64;
        } else if i >= period {
            mean += (x - values[i - period]) / period as f64;
        }

        points.push(IndicatorPoint {
            date,
            valid,
            value: if valid { mean } else { 0.0 },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values: points,
    }
}

/// Arithmetic mean of the `period` observations ending at `index`, inclusive.
pub fn trailing_mean(values: &[f64], index: usize, period: usize) -> Option<f64> {
    if period == 0 || index >= values.len() || index + 1 < period {
        return None;
    }
    let window = &values[index + 1 - period..=index];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Incremental moving average for streaming input.
#[derive(Debug, Clone)]
pub struct RollingMean {
    period: usize,
    window: VecDeque<f64>,
    mean: Option<f64>,
}

impl RollingMean {
    /// `None` for a zero period, which has no mean.
    pub fn new(period: usize) -> Option<Self> {
        if period == 0 {
            return None;
        }
        Some(Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            mean: None,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn current(&self) -> Option<f64> {
        self.mean
    }

    /// Feeds the next observation; returns the mean once the window is full.
    pub fn push(&mut self, x: f64) -> Option<f64> {
        self.window.push_back(x);

        if self.window.len() > self.period {
            let leaving = self.window.pop_front().unwrap_or(0.0);
            if let Some(mean) = self.mean.as_mut() {
                *mean += (x - leaving) / self.period as f64;
            }
        } else if self.window.len() == self.period {
            self.mean = Some(self.window.iter().sum::<f64>() / self.period as f64);
        }

        self.mean
    }
}
