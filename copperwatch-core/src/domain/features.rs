//! Feature tables aligned by date to a price series.
//!
//! Features are produced by external collaborators; this module only checks
//! shape, intersects dates with the price series, and flags incomplete rows
//! so the orchestrator can exclude them from training.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::series::PriceSeries;

/// Errors from feature table construction or alignment.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("row count {rows} does not match date count {dates}")]
    RowCountMismatch { rows: usize, dates: usize },
    #[error("row {index} has {got} values, expected {expected}")]
    RaggedRow {
        index: usize,
        got: usize,
        expected: usize,
    },
    #[error("feature dates are not strictly increasing at row {index}")]
    UnorderedDates { index: usize },
    #[error("feature table shares no dates with the price series")]
    NoOverlap,
}

/// Rectangular feature matrix keyed by date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn new(
        dates: Vec<NaiveDate>,
        names: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, FeatureError> {
        if rows.len() != dates.len() {
            return Err(FeatureError::RowCountMismatch {
                rows: rows.len(),
                dates: dates.len(),
            });
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(FeatureError::RaggedRow {
                    index: i,
                    got: row.len(),
                    expected: names.len(),
                });
            }
        }
        for i in 1..dates.len() {
            if dates[i] <= dates[i - 1] {
                return Err(FeatureError::UnorderedDates { index: i });
            }
        }
        Ok(Self { dates, names, rows })
    }

    /// Build a lagged-return feature table from a price series.
    ///
    /// Column `k` holds the close-to-close return over `lags[k]` bars. Rows
    /// before the longest lag carry NaN and are excluded from training by the
    /// orchestrator.
    pub fn lagged_returns(series: &PriceSeries, lags: &[usize]) -> Result<Self, FeatureError> {
        let closes = series.closes();
        let names = lags.iter().map(|l| format!("ret_{l}d")).collect();
        let rows = (0..closes.len())
            .map(|i| {
                lags.iter()
                    .map(|&lag| {
                        if lag == 0 || i < lag || closes[i - lag] == 0.0 {
                            f64::NAN
                        } else {
                            closes[i] / closes[i - lag] - 1.0
                        }
                    })
                    .collect()
            })
            .collect();
        Self::new(series.dates(), names, rows)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Intersect this table with a price series on date.
    ///
    /// Both inputs are sorted, so a single merge pass suffices. An empty
    /// intersection is a structural input error and fails fast.
    pub fn align(&self, series: &PriceSeries) -> Result<AlignedData, FeatureError> {
        let mut dates = Vec::new();
        let mut closes = Vec::new();
        let mut rows = Vec::new();

        let bars = series.bars();
        let (mut i, mut j) = (0, 0);
        while i < self.dates.len() && j < bars.len() {
            match self.dates[i].cmp(&bars[j].date) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dates.push(self.dates[i]);
                    closes.push(bars[j].close);
                    rows.push(self.rows[i].clone());
                    i += 1;
                    j += 1;
                }
            }
        }

        if dates.is_empty() {
            return Err(FeatureError::NoOverlap);
        }
        Ok(AlignedData { dates, closes, rows })
    }
}

/// Price closes and feature rows restricted to their common dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedData {
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
    pub rows: Vec<Vec<f64>>,
}

impl AlignedData {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// True when row `i` has no NaN values and may be used for training.
    pub fn row_is_complete(&self, i: usize) -> bool {
        self.rows[i].iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::PriceBar;

    fn series(days: &[u32]) -> PriceSeries {
        let bars = days
            .iter()
            .enumerate()
            .map(|(i, &d)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0 + i as f64,
                volume: 1,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn rejects_ragged_rows() {
        let dates = vec![NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()];
        let err = FeatureTable::new(dates, vec!["a".into(), "b".into()], vec![vec![1.0]]);
        assert!(matches!(err, Err(FeatureError::RaggedRow { .. })));
    }

    #[test]
    fn align_intersects_on_date() {
        let s = series(&[2, 3, 4, 5]);
        let dates: Vec<NaiveDate> = [3u32, 4, 6]
            .iter()
            .map(|&d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        let table =
            FeatureTable::new(dates, vec!["x".into()], vec![vec![1.0], vec![2.0], vec![3.0]])
                .unwrap();

        let aligned = table.align(&s).unwrap();
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned.closes, vec![101.0, 102.0]);
        assert_eq!(aligned.rows, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn align_fails_on_disjoint_dates() {
        let s = series(&[2, 3]);
        let dates = vec![NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()];
        let table = FeatureTable::new(dates, vec!["x".into()], vec![vec![1.0]]).unwrap();
        assert!(matches!(table.align(&s), Err(FeatureError::NoOverlap)));
    }

    #[test]
    fn lagged_returns_marks_warmup_rows_incomplete() {
        let s = series(&[2, 3, 4, 5]);
        let table = FeatureTable::lagged_returns(&s, &[1, 2]).unwrap();
        let aligned = table.align(&s).unwrap();
        assert!(!aligned.row_is_complete(0));
        assert!(!aligned.row_is_complete(1));
        assert!(aligned.row_is_complete(2));
        assert!(aligned.row_is_complete(3));
    }
}
