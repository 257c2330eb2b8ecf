#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Aggregation views over disaster location records.
//!
//! Each view is a stateless function over an injected [`DocumentStore`]:
//! full or filtered scan, per-record shaping, no writes. Per-record
//! leniency is the rule here — a record with broken coordinates or a
//! dangling post reference degrades that record, never the whole view.

pub mod archive;
pub mod breaking;
pub mod heatmap;
pub mod top_posts;

use disaster_map_models::{Record, value};
use disaster_map_store::StoreError;
use thiserror::Error;

/// Errors from building a view.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The requested location aggregate does not exist.
    #[error("Location not found")]
    NotFound,

    /// The underlying store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Applies numeric wire normalization to a whole record.
pub(crate) fn normalize_record(record: Record) -> Record {
    match value::normalize(serde_json::Value::Object(record)) {
        serde_json::Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// Reads a lenient float field, defaulting to 0 on anything that does
/// not coerce to a number.
pub(crate) fn f64_or_zero(record: &Record, field: &str) -> f64 {
    record.get(field).and_then(value::as_f64).unwrap_or(0.0)
}

/// Display intensity for a location: average severity score times post
/// count, with malformed operands and non-finite products collapsing
/// to 0 instead of failing the record.
pub(crate) fn intensity(record: &Record) -> f64 {
    let product = f64_or_zero(record, "avg_score") * f64_or_zero(record, "post_count");
    if product.is_finite() { product } else { 0.0 }
}
