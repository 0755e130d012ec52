//! Walk-forward windowing — rolling train/test splits over a price history.
//!
//! `test_start` begins at `initial_train_size` and advances by `step_size`
//! while the test window still fits. A step whose implied train length is
//! below `min_train_size` is skipped but does not stop advancement, so a
//! short head of the series never truncates the rest of the plan.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

/// Configuration for walk-forward splitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// First test start index (default 252 ≈ one trading year of training).
    pub initial_train_size: usize,
    /// Test window length (default 30 ≈ one month).
    pub test_size: usize,
    /// Advance per fold (default 15 ≈ half a month).
    pub step_size: usize,
    /// Minimum usable train length (default 100).
    pub min_train_size: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            initial_train_size: 252,
            test_size: 30,
            step_size: 15,
            min_train_size: 100,
        }
    }
}

/// Errors from window plan construction.
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("step_size must be positive")]
    ZeroStep,
    #[error("test_size must be positive")]
    ZeroTest,
}

/// One train/test split. `train.end == test.start` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWindow {
    /// Fold position in the full advancement, counting skipped steps, so log
    /// lines keep a stable index whether or not earlier folds were skipped.
    pub index: usize,
    pub train: Range<usize>,
    pub test: Range<usize>,
}

/// Lazy, finite, restartable sequence of validation windows.
///
/// Deterministic given identical inputs; `iter()` restarts from the first
/// window every time.
#[derive(Debug, Clone)]
pub struct WindowPlan {
    config: WindowConfig,
    n: usize,
}

impl WindowPlan {
    pub fn new(config: WindowConfig, series_len: usize) -> Result<Self, WindowError> {
        if config.step_size == 0 {
            return Err(WindowError::ZeroStep);
        }
        if config.test_size == 0 {
            return Err(WindowError::ZeroTest);
        }
        Ok(Self {
            config,
            n: series_len,
        })
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn iter(&self) -> Windows {
        Windows {
            config: self.config.clone(),
            n: self.n,
            test_start: self.config.initial_train_size,
            index: 0,
        }
    }

    /// Number of windows the plan will emit.
    pub fn emitted(&self) -> usize {
        self.iter().count()
    }

    /// Number of advancement steps skipped for insufficient training data.
    pub fn skipped(&self) -> usize {
        let mut skipped = 0;
        let mut test_start = self.config.initial_train_size;
        while test_start + self.config.test_size <= self.n {
            if test_start < self.config.min_train_size {
                skipped += 1;
            }
            test_start += self.config.step_size;
        }
        skipped
    }
}

/// Iterator over the valid windows of a [`WindowPlan`].
#[derive(Debug, Clone)]
pub struct Windows {
    config: WindowConfig,
    n: usize,
    test_start: usize,
    index: usize,
}

impl Iterator for Windows {
    type Item = ValidationWindow;

    fn next(&mut self) -> Option<ValidationWindow> {
        while self.test_start + self.config.test_size <= self.n {
            let test_start = self.test_start;
            let index = self.index;
            self.test_start += self.config.step_size;
            self.index += 1;

            // Train slice is everything before the test window.
            if test_start < self.config.min_train_size {
                continue;
            }
            return Some(ValidationWindow {
                index,
                train: 0..test_start,
                test: test_start..test_start + self.config.test_size,
            });
        }
        None
    }
}
