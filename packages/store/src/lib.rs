#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Document store abstraction for disaster map records.
//!
//! Records live in an external key-value document store (`DynamoDB` in
//! production) keyed by a single string attribute per table. Spatial and
//! aggregation views only ever use [`DocumentStore::scan`] with an
//! optional coarse filter and manual pagination; the CRUD surface uses
//! the point operations.
//!
//! The store is injected as `Arc<dyn DocumentStore>` so views and the
//! search engine can be tested against [`memory::MemoryStore`].

pub mod dynamo;
pub mod memory;

use async_trait::async_trait;
use disaster_map_models::{BoundingBox, Record, value};
use thiserror::Error;

/// Errors from document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure: the store could not be reached, or the
    /// call timed out.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of the transport failure.
        message: String,
    },

    /// Store-reported operational error (e.g. a conditional check
    /// failure). The store's own message is passed through.
    #[error("{message}")]
    Operation {
        /// Message reported by the store.
        message: String,
    },
}

/// Opaque continuation marker for a paginated scan.
///
/// Produced by the store when a scan page is truncated; passed back
/// verbatim to resume. The inner map is the store's last-evaluated key
/// in JSON form and has no meaning to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationToken(pub Record);

/// One page of scan results.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Records on this page, in the store's natural order.
    pub records: Vec<Record>,
    /// Present when more results remain.
    pub next_token: Option<ContinuationToken>,
}

/// A store-native filter expression for scans.
///
/// Deliberately coarse: the store only needs to narrow the scan, never
/// to decide final membership. Exact predicates (great-circle distance)
/// are applied client-side afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanFilter {
    /// Both coordinates fall inside the bounding box. When the box
    /// leaves longitude unrestricted (polar searches), only the
    /// latitude band is filtered.
    CoordinatesWithin(BoundingBox),
    /// A field equals a value exactly (e.g. `snapshot_date = "2024-01-01"`).
    FieldEquals {
        /// Attribute name.
        field: String,
        /// Value to compare against.
        value: serde_json::Value,
    },
}

impl ScanFilter {
    /// Evaluates the filter against a record, mirroring the store-side
    /// semantics. Used by the in-memory store; the `DynamoDB`
    /// implementation translates to a native filter expression instead.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::CoordinatesWithin(bbox) => {
                let Some(lat) = record.get("lat").and_then(value::as_f64) else {
                    return false;
                };
                let Some(lon) = record.get("lon").and_then(value::as_f64) else {
                    return false;
                };
                let lat_ok = lat >= bbox.lat_min && lat <= bbox.lat_max;
                let lon_ok = bbox.unbounded_longitude()
                    || (lon >= bbox.lon_min && lon <= bbox.lon_max);
                lat_ok && lon_ok
            }
            Self::FieldEquals { field, value } => record.get(field) == Some(value),
        }
    }
}

/// External document store with point operations and filtered scans.
///
/// Implementations must not retry failed calls; retry policy belongs to
/// the underlying SDK configuration, not this layer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches a record by its key attribute value.
    async fn get_item(&self, key: &str) -> Result<Option<Record>, StoreError>;

    /// Inserts or replaces a record.
    async fn put_item(&self, record: Record) -> Result<(), StoreError>;

    /// Sets a single field on a record, returning the updated fields.
    async fn update_item(
        &self,
        key: &str,
        field: &str,
        new_value: serde_json::Value,
    ) -> Result<Record, StoreError>;

    /// Deletes a record, returning it as it was before removal.
    async fn delete_item(&self, key: &str) -> Result<Option<Record>, StoreError>;

    /// Returns one page of records matching the filter, with a
    /// continuation token when more remain.
    async fn scan(
        &self,
        filter: Option<&ScanFilter>,
        token: Option<ContinuationToken>,
    ) -> Result<ScanPage, StoreError>;
}

/// Drains a paginated scan to completion.
///
/// Explicit loop with an accumulator: each page's continuation token is
/// fed back until the store stops returning one. All pages are held in
/// memory at once — acceptable because callers always pass a filter that
/// bounds the result size. There is no page-count cap, so an overly
/// permissive filter means unbounded growth; that tradeoff is deliberate.
///
/// # Errors
///
/// Propagates the first [`StoreError`] without retrying.
pub async fn scan_all(
    store: &dyn DocumentStore,
    filter: Option<&ScanFilter>,
) -> Result<Vec<Record>, StoreError> {
    let mut records = Vec::new();
    let mut token = None;
    let mut pages = 0usize;

    loop {
        let page = store.scan(filter, token).await?;
        pages += 1;
        records.extend(page.records);
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    log::debug!("Scan drained {pages} page(s), {} record(s)", records.len());
    Ok(records)
}
