#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Forward geocoding for free-text place queries.
//!
//! One provider: **OpenCage** ([`opencage`]), matching the production
//! deployment. The [`Geocoder`] trait keeps the search engine testable
//! without network access; swap in a stub that returns canned
//! [`GeocodeResult`]s.

pub mod opencage;

use async_trait::async_trait;
use disaster_map_models::GeocodeResult;
use thiserror::Error;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed (transport error or timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// No API key configured for the provider.
    #[error("Missing geocoder API key")]
    MissingApiKey,
}

/// Resolves free-text place names to coordinates.
///
/// `Ok(None)` means the provider answered but found no match; transport
/// failures are errors.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocodes a free-text query, returning the best match if any.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeResult>, GeocodeError>;
}
