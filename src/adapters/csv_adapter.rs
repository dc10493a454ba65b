//! Delimited price file adapter.
//!
//! Columns are resolved by header name. Rows come back in file order.

use crate::domain::error::RebalancerError;
use crate::domain::price::PriceBar;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::path::PathBuf;

/// How a price file is laid out.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvLayout {
    pub delimiter: u8,
    pub date_column: String,
    pub equity_column: String,
    pub bond_column: String,
    pub date_format: String,
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            delimiter: b';',
            date_column: "Date".to_string(),
            equity_column: "DOW JONES COMPOSITE".to_string(),
            bond_column: "TLT 20Y".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

pub struct CsvPriceAdapter {
    path: PathBuf,
    layout: CsvLayout,
}

struct ColumnIndex {
    date: usize,
    equity: usize,
    bond: usize,
}

impl CsvPriceAdapter {
    pub fn new(path: PathBuf, layout: CsvLayout) -> Self {
        Self { path, layout }
    }

    fn read_error(&self, reason: impl std::fmt::Display) -> RebalancerError {
        RebalancerError::DataRead {
            reason: format!("{}: {}", self.path.display(), reason),
        }
    }

    fn resolve_columns(&self, headers: &StringRecord) -> Result<ColumnIndex, RebalancerError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| self.read_error(format!("missing column '{}'", name)))
        };
        Ok(ColumnIndex {
            date: find(&self.layout.date_column)?,
            equity: find(&self.layout.equity_column)?,
            bond: find(&self.layout.bond_column)?,
        })
    }

    fn parse_row(
        &self,
        record: &StringRecord,
        columns: &ColumnIndex,
    ) -> Result<PriceBar, RebalancerError> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |index: usize, name: &str| {
            record
                .get(index)
                .map(str::trim)
                .ok_or_else(|| self.read_error(format!("line {}: missing {} value", line, name)))
        };
        let number = |index: usize, name: &str| -> Result<f64, RebalancerError> {
            let raw = field(index, name)?;
            raw.parse().map_err(|e| {
                self.read_error(format!("line {}: invalid {} value '{}': {}", line, name, raw, e))
            })
        };

        let raw_date = field(columns.date, "date")?;
        let date = NaiveDate::parse_from_str(raw_date, &self.layout.date_format).map_err(|e| {
            self.read_error(format!("line {}: invalid date '{}': {}", line, raw_date, e))
        })?;

        Ok(PriceBar {
            date,
            equity: number(columns.equity, "equity")?,
            bond: number(columns.bond, "bond")?,
        })
    }
}

impl PriceDataPort for CsvPriceAdapter {
    fn load_prices(&self) -> Result<Vec<PriceBar>, RebalancerError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.layout.delimiter)
            .from_path(&self.path)
            .map_err(|e| self.read_error(e))?;

        let headers = rdr.headers().map_err(|e| self.read_error(e))?.clone();
        let columns = self.resolve_columns(&headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| self.read_error(e))?;
            bars.push(self.parse_row(&record, &columns)?);
        }

        tracing::info!(path = %self.path.display(), rows = bars.len(), "loaded price data");
        Ok(bars)
    }

    fn data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RebalancerError> {
        let bars = self.load_prices()?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
