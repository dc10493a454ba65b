//! Price data access port trait.

use crate::domain::error::RebalancerError;
use crate::domain::price::PriceBar;
use chrono::NaiveDate;

pub trait PriceDataPort {
    /// All rows in source order. Ordering is checked by the domain, not here.
    fn load_prices(&self) -> Result<Vec<PriceBar>, RebalancerError>;

    /// First date, last date and row count, or `None` for an empty source.
    fn data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RebalancerError>;
}
