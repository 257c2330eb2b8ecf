#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Proximity search over disaster location aggregates.
//!
//! Answers "what records are within R miles of place X" in four steps:
//! geocode the free-text query, plan an over-approximating bounding box,
//! drain a store scan filtered to that box, then keep only candidates
//! whose exact great-circle distance is within the radius. Deliberately
//! not a spatial index: the store-side box filter bounds the scan, the
//! haversine pass decides membership.

use std::sync::Arc;

use disaster_map_geocoder::{GeocodeError, Geocoder};
use disaster_map_models::{GeocodeResult, Record, value};
use disaster_map_spatial::{distance_miles, plan_bounding_box};
use disaster_map_store::{DocumentStore, ScanFilter, StoreError, scan_all};
use serde::Serialize;
use thiserror::Error;

/// Default search radius in miles, shared by the bounding box and the
/// final acceptance threshold.
pub const DEFAULT_RADIUS_MILES: f64 = 50.0;

/// Errors from a proximity search, mapped to HTTP status by the server.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Missing or malformed required input.
    #[error("{message}")]
    InvalidArgument {
        /// What was wrong with the input.
        message: String,
    },

    /// The query resolved to no known place.
    #[error("Location not found")]
    NotFound,

    /// Geocoder or store transport failure.
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable {
        /// Description of the upstream failure.
        message: String,
    },

    /// Store-reported operational error, message passed through.
    #[error("{message}")]
    Store {
        /// Message reported by the store.
        message: String,
    },
}

impl From<GeocodeError> for SearchError {
    fn from(err: GeocodeError) -> Self {
        Self::UpstreamUnavailable {
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable { message } => Self::UpstreamUnavailable { message },
            StoreError::Operation { message } => Self::Store { message },
        }
    }
}

/// Result of a proximity search: the resolved place and every record
/// within the radius, in the store's natural scan order.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// The geocoded place the query resolved to.
    #[serde(rename = "search-hit")]
    pub search_hit: GeocodeResult,
    /// Location aggregates within the radius, unsorted.
    #[serde(rename = "nearby-records")]
    pub nearby_records: Vec<Record>,
}

/// Proximity search engine with injected geocoder and store.
pub struct ProximitySearch {
    geocoder: Arc<dyn Geocoder>,
    locations: Arc<dyn DocumentStore>,
    radius_miles: f64,
}

impl ProximitySearch {
    /// Creates an engine searching `radius_miles` around resolved places.
    #[must_use]
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        locations: Arc<dyn DocumentStore>,
        radius_miles: f64,
    ) -> Self {
        Self {
            geocoder,
            locations,
            radius_miles,
        }
    }

    /// Finds location aggregates within the radius of a free-text place.
    ///
    /// Candidates with missing or non-numeric coordinates are silently
    /// dropped; everything else is filtered by exact distance, with the
    /// boundary inclusive (`distance <= radius`).
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidArgument`] for a blank query (the geocoder
    /// is not called), [`SearchError::NotFound`] when the geocoder has
    /// no match, [`SearchError::UpstreamUnavailable`] on geocoder or
    /// store transport failure, [`SearchError::Store`] on store-reported
    /// errors.
    pub async fn search_near(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidArgument {
                message: "Missing 'search' parameter".to_string(),
            });
        }

        let place = self
            .geocoder
            .geocode(query)
            .await?
            .ok_or(SearchError::NotFound)?;

        let bbox = plan_bounding_box(place.lat, place.lon, self.radius_miles);
        log::debug!(
            "Search '{query}' resolved to '{}' ({}, {}); scanning box {bbox:?}",
            place.formatted,
            place.lat,
            place.lon
        );

        let filter = ScanFilter::CoordinatesWithin(bbox);
        let candidates = scan_all(self.locations.as_ref(), Some(&filter)).await?;

        let nearby_records: Vec<Record> = candidates
            .into_iter()
            .filter(|record| {
                let Some(lat) = record.get("lat").and_then(value::as_f64) else {
                    return false;
                };
                let Some(lon) = record.get("lon").and_then(value::as_f64) else {
                    return false;
                };
                distance_miles(place.lat, place.lon, lat, lon) <= self.radius_miles
            })
            .map(|record| match value::normalize(serde_json::Value::Object(record)) {
                serde_json::Value::Object(map) => map,
                _ => Record::new(),
            })
            .collect();

        Ok(SearchOutcome {
            search_hit: place,
            nearby_records,
        })
    }
}
