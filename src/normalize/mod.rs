//! Category normalizers: raw tables and record lists in, canonical
//! timestamp-sorted series out.

pub mod anthro;
pub mod lungs;
pub mod meals;
pub mod timestamp;
pub mod types;
pub mod vitals;

pub use types::{NormalizedSeries, Row, Value};

/// A category-level normalization failure. Distinct from a missing file:
/// the file was there, but its contents cannot be shaped into a series.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("no usable timestamp column")]
    MissingTimestamp,
    #[error("missing required column `{0}`")]
    MissingColumn(String),
    #[error("expected {0} input for this category")]
    UnexpectedFormat(&'static str),
}
