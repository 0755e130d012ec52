//! Validated price series: ascending dates, no duplicates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::PriceBar;

/// Errors from series construction.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("dates must be strictly increasing: bar {index} has {date} after {prev}")]
    NonIncreasingDate {
        index: usize,
        prev: NaiveDate,
        date: NaiveDate,
    },
}

/// Ordered sequence of daily bars with strictly increasing dates.
///
/// Construction validates the ordering invariant once; everything downstream
/// (windowing, alignment, regime detection) relies on it and never re-checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<PriceBar>", into = "Vec<PriceBar>")]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        for i in 1..bars.len() {
            if bars[i].date <= bars[i - 1].date {
                return Err(SeriesError::NonIncreasingDate {
                    index: i,
                    prev: bars[i - 1].date,
                    date: bars[i].date,
                });
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

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// The freshest and the immediately preceding bar, if at least two exist.
    pub fn latest_pair(&self) -> Option<(&PriceBar, &PriceBar)> {
        let n = self.bars.len();
        if n < 2 {
            return None;
        }
        Some((&self.bars[n - 1], &self.bars[n - 2]))
    }
}

impl TryFrom<Vec<PriceBar>> for PriceSeries {
    type Error = SeriesError;

    fn try_from(bars: Vec<PriceBar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}

impl From<PriceSeries> for Vec<PriceBar> {
    fn from(series: PriceSeries) -> Self {
        series.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 10_000,
        }
    }

    #[test]
    fn accepts_ascending_dates() {
        let series = PriceSeries::new(vec![bar(2, 70_000.0), bar(3, 70_100.0)]).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new(vec![bar(2, 70_000.0), bar(2, 70_100.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::NonIncreasingDate { index: 1, .. }));
    }

    #[test]
    fn rejects_descending_dates() {
        assert!(PriceSeries::new(vec![bar(3, 70_000.0), bar(2, 70_100.0)]).is_err());
    }

    #[test]
    fn latest_pair_orders_newest_first() {
        let series = PriceSeries::new(vec![bar(2, 70_000.0), bar(3, 70_100.0)]).unwrap();
        let (latest, previous) = series.latest_pair().unwrap();
        assert_eq!(latest.close, 70_100.0);
        assert_eq!(previous.close, 70_000.0);
    }

    #[test]
    fn latest_pair_requires_two_bars() {
        let series = PriceSeries::new(vec![bar(2, 70_000.0)]).unwrap();
        assert!(series.latest_pair().is_none());
    }
}
