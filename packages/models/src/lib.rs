#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Record types and store value normalization for the disaster map.
//!
//! Store records are schemaless JSON object maps as returned by the
//! document store; the typed views here (`HeatmapLocation`,
//! `ArchiveEntry`, ...) are derived per-request and never written back.
//! Numeric normalization of the store's decimal wire format lives in
//! [`value`].

pub mod value;

use serde::{Deserialize, Serialize};

/// A schemaless record as stored in and retrieved from the document store.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A latitude/longitude rectangle used as a coarse spatial pre-filter.
///
/// The box deliberately over-approximates the search circle; exact
/// membership is decided afterwards by great-circle distance. `lon_min`
/// and `lon_max` span the full [-180, 180] range when the planner
/// declines to restrict longitude (near the poles).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub lat_min: f64,
    /// Northern latitude boundary.
    pub lat_max: f64,
    /// Western longitude boundary.
    pub lon_min: f64,
    /// Eastern longitude boundary.
    pub lon_max: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given boundaries.
    #[must_use]
    pub const fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Whether the box imposes no longitude restriction.
    #[must_use]
    pub fn unbounded_longitude(&self) -> bool {
        self.lon_min <= -180.0 && self.lon_max >= 180.0
    }
}

/// A resolved place from the external geocoder.
///
/// Ephemeral: produced per-request and discarded after the search
/// completes. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// Canonical display name returned by the geocoder. Serialized as
    /// `location_name` for wire compatibility with the frontend.
    #[serde(rename = "location_name")]
    pub formatted: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
}

/// One renderable heatmap point derived from a location aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapLocation {
    /// Location name (natural key of the aggregate record).
    pub location_name: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
    /// Disaster category label -> report count.
    pub disaster_breakdown: serde_json::Value,
    /// Display intensity: average severity score x post count.
    pub intensity: f64,
    /// Denormalized top post references, passed through as stored.
    pub top_posts: serde_json::Value,
}

/// One archive view entry derived from a time-snapshotted aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Location name (natural key of the snapshotted aggregate).
    pub location_name: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
    /// Disaster category label -> report count.
    pub disaster_breakdown: serde_json::Value,
    /// Display intensity: average severity score x post count.
    pub intensity: f64,
    /// Calendar date of the snapshot (e.g. "2024-01-01").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_date: Option<String>,
    /// Timestamp of the snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_ts: Option<String>,
    /// When the snapshotting job wrote the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<String>,
    /// Last update time of the source aggregate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Ordered top post identifiers at snapshot time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_post_ids: Option<serde_json::Value>,
}

/// One entry of a location aggregate's ordered `top_posts` id list.
///
/// The ingestion process has written these in two shapes over time: a
/// plain string id, and a tagged-value wrapper (`{"S": "<id>"}`) carried
/// over verbatim from the store's wire format. Both resolve to the same
/// post id; anything else is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostIdEntry {
    /// A plain string id.
    PlainId(String),
    /// An id wrapped in the store's tagged-value format.
    WrappedId(String),
}

impl PostIdEntry {
    /// Parses a raw list entry into a [`PostIdEntry`], or `None` for
    /// unrecognized shapes.
    #[must_use]
    pub fn parse(raw: &serde_json::Value) -> Option<Self> {
        match raw {
            serde_json::Value::String(id) => Some(Self::PlainId(id.clone())),
            serde_json::Value::Object(map) => {
                let id = map.get("S")?.as_str()?;
                Some(Self::WrappedId(id.to_string()))
            }
            _ => None,
        }
    }

    /// The post id this entry refers to.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::PlainId(id) | Self::WrappedId(id) => id,
        }
    }
}
