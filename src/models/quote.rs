use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One row of daily market data for a single calendar date
///
/// # Change Fields
/// `change` and `change_percent` are derived from consecutive closes and are
/// recomputed over the full dataset before persistence. The earliest record
/// carries `None` (no prior close).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Trading date, the unique key within a dataset
    pub date: NaiveDate,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Close-to-close change, rounded to 2 decimals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,

    /// Close-to-close change in percent, rounded to 2 decimals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,

    /// Total shares traded
    pub total_shares: u64,

    /// Trading volume
    pub volume: u64,

    /// Number of trades
    pub trade_count: u64,
}

impl QuoteRecord {
    /// Create a new quote record with only the scraped columns
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        total_shares: u64,
        volume: u64,
        trade_count: u64,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            change: None,
            change_percent: None,
            total_shares,
            volume,
            trade_count,
        }
    }
}

/// One row as it comes out of a scraped table: every cell still a string.
///
/// Cells keep whatever the upstream table printed: thousands separators in
/// numbers, a trailing `%` on the change-percent cell, `DD/MM/YYYY` dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuoteRow {
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub change: String,
    pub change_percent: String,
    pub total_shares: String,
    pub volume: String,
    pub trade_count: String,
}

impl RawQuoteRow {
    /// Parse into a typed record. Any malformed cell fails the whole row.
    pub fn parse(&self) -> Result<QuoteRecord> {
        let date = parse_cell_date(&self.date)?;
        let mut record = QuoteRecord::new(
            date,
            parse_cell_price(&self.open)?,
            parse_cell_price(&self.high)?,
            parse_cell_price(&self.low)?,
            parse_cell_price(&self.close)?,
            parse_cell_count(&self.total_shares)?,
            parse_cell_count(&self.volume)?,
            parse_cell_count(&self.trade_count)?,
        );
        // Scraped change cells are carried through for completeness; the
        // orchestrator recomputes both before persisting.
        record.change = parse_cell_optional_price(&self.change)?;
        record.change_percent = parse_cell_optional_percent(&self.change_percent)?;
        Ok(record)
    }
}

/// Format a record into on-disk cells, in cache header column order
pub fn quote_cells(record: &QuoteRecord) -> Vec<String> {
    vec![
        record.date.format("%Y-%m-%d").to_string(),
        record.close.to_string(),
        record.open.to_string(),
        record.high.to_string(),
        record.low.to_string(),
        record
            .change
            .map(|v| format!("{:.2}", v))
            .unwrap_or_default(),
        record
            .change_percent
            .map(|v| format!("{:.2}", v))
            .unwrap_or_default(),
        record.total_shares.to_string(),
        record.volume.to_string(),
        record.trade_count.to_string(),
    ]
}

/// Parse a date cell: `DD/MM/YYYY` as scraped, or ISO `YYYY-MM-DD`
pub fn parse_cell_date(cell: &str) -> Result<NaiveDate> {
    let trimmed = cell.trim();
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| Error::Parse(format!("Invalid date cell: {:?}", cell)))
}

/// Parse a price cell, stripping thousands separators (`"1,234.56"`)
pub fn parse_cell_price(cell: &str) -> Result<f64> {
    let cleaned = cell.trim().replace(',', "");
    cleaned
        .parse()
        .map_err(|_| Error::Parse(format!("Invalid price cell: {:?}", cell)))
}

/// Parse an integer cell, stripping thousands separators
pub fn parse_cell_count(cell: &str) -> Result<u64> {
    let cleaned = cell.trim().replace(',', "");
    cleaned
        .parse()
        .map_err(|_| Error::Parse(format!("Invalid count cell: {:?}", cell)))
}

/// Parse an optional price cell; empty or `-` means absent
pub fn parse_cell_optional_price(cell: &str) -> Result<Option<f64>> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Ok(None);
    }
    parse_cell_price(trimmed).map(Some)
}

/// Parse an optional percent cell, stripping the `%` suffix
pub fn parse_cell_optional_percent(cell: &str) -> Result<Option<f64>> {
    let trimmed = cell.trim().trim_end_matches('%');
    parse_cell_optional_price(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row(date: &str) -> RawQuoteRow {
        RawQuoteRow {
            date: date.to_string(),
            open: "1,230.5".to_string(),
            high: "1,260.0".to_string(),
            low: "1,200.0".to_string(),
            close: "1,250.25".to_string(),
            change: "12.25".to_string(),
            change_percent: "0.99%".to_string(),
            total_shares: "1,500,000".to_string(),
            volume: "2,000,000".to_string(),
            trade_count: "320".to_string(),
        }
    }

    #[test]
    fn test_parse_scraped_row() {
        let record = raw_row("06/10/2023").parse().unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 10, 6).unwrap());
        assert_eq!(record.open, 1230.5);
        assert_eq!(record.close, 1250.25);
        assert_eq!(record.change, Some(12.25));
        assert_eq!(record.change_percent, Some(0.99));
        assert_eq!(record.total_shares, 1_500_000);
        assert_eq!(record.volume, 2_000_000);
        assert_eq!(record.trade_count, 320);
    }

    #[test]
    fn test_parse_iso_date() {
        let record = raw_row("2023-10-06").parse().unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 10, 6).unwrap());
    }

    #[test]
    fn test_parse_empty_change_cells() {
        let mut row = raw_row("06/10/2023");
        row.change = "".to_string();
        row.change_percent = "-".to_string();
        let record = row.parse().unwrap();
        assert_eq!(record.change, None);
        assert_eq!(record.change_percent, None);
    }

    #[test]
    fn test_malformed_cell_fails_row() {
        let mut row = raw_row("06/10/2023");
        row.close = "n/a".to_string();
        assert!(row.parse().is_err());

        assert!(raw_row("not a date").parse().is_err());
    }
}
