//! Core domain types: price bars, validated series, feature tables,
//! prediction records.

pub mod bar;
pub mod features;
pub mod prediction;
pub mod series;

pub use bar::PriceBar;
pub use features::{AlignedData, FeatureError, FeatureTable};
pub use prediction::PredictionRecord;
pub use series::{PriceSeries, SeriesError};
