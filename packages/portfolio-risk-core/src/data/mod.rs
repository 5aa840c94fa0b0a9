//! Price data module.
//!
//! Provides the raw table model, market-data sources, and normalization into
//! the canonical price matrix.

mod matrix;
mod normalize;
mod raw;
mod source;

pub use matrix::CanonicalPriceMatrix;
pub use normalize::{normalize, Level, PriceFieldRule, PRICE_FIELD_RULES};
pub use raw::{parse_index_date, ColumnKey, ColumnScheme, ColumnValues, RawColumn, RawTable};
pub use source::{JsonFileSource, PriceSource, StaticSource};
