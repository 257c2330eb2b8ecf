//! Heatmap view: raw location aggregates to renderable intensity points.

use disaster_map_models::{HeatmapLocation, Record, value};
use disaster_map_store::{DocumentStore, scan_all};
use serde_json::Value;

use crate::{ViewError, intensity};

/// Builds the heatmap from every location aggregate in the store.
///
/// Records with missing or non-numeric coordinates are skipped — partial
/// results are valid, and the skip count is only logged. Output order is
/// the store's natural scan order, which is not guaranteed stable.
///
/// # Errors
///
/// Returns [`ViewError::Store`] if the scan fails.
pub async fn build_heatmap(
    locations: &dyn DocumentStore,
) -> Result<Vec<HeatmapLocation>, ViewError> {
    let records = scan_all(locations, None).await?;
    let total = records.len();

    let heatmap: Vec<HeatmapLocation> = records.iter().filter_map(heatmap_location).collect();

    let skipped = total - heatmap.len();
    if skipped > 0 {
        log::warn!("Heatmap skipped {skipped} of {total} records with unusable coordinates");
    }

    Ok(heatmap)
}

/// Shapes one aggregate record into a heatmap point, or `None` when the
/// coordinates are unusable.
fn heatmap_location(record: &Record) -> Option<HeatmapLocation> {
    let lat = record.get("lat").and_then(value::as_f64)?;
    let lon = record.get("lon").and_then(value::as_f64)?;

    let location_name = record
        .get("location_name")
        .and_then(Value::as_str)
        .unwrap_or("NULL")
        .to_string();

    let disaster_breakdown = value::normalize(
        record
            .get("disaster_breakdown")
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
    );

    let top_posts = value::normalize(
        record
            .get("top_posts")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())),
    );

    Some(HeatmapLocation {
        location_name,
        lat,
        lon,
        disaster_breakdown,
        intensity: intensity(record),
        top_posts,
    })
}

#[cfg(test)]
mod tests {
    use disaster_map_store::memory::MemoryStore;
    use serde_json::json;

    use super::*;

    fn record(pairs: serde_json::Value) -> Record {
        pairs.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn builds_points_in_scan_order() {
        let store = MemoryStore::with_records(
            "location_name",
            100,
            vec![
                record(json!({
                    "location_name": "Atlanta", "lat": 33.749, "lon": -84.388,
                    "avg_score": 2.0, "post_count": 5,
                    "disaster_breakdown": {"Hurricane": 3.0, "Flood": 2}
                })),
                record(json!({
                    "location_name": "Mumbai", "lat": 19.076, "lon": 72.8777,
                    "avg_score": 3.0, "post_count": 2
                })),
            ],
        );

        let heatmap = build_heatmap(&store).await.unwrap();
        assert_eq!(heatmap.len(), 2);
        assert_eq!(heatmap[0].location_name, "Atlanta");
        assert!((heatmap[0].intensity - 10.0).abs() < 1e-12);
        assert_eq!(heatmap[0].disaster_breakdown, json!({"Hurricane": 3, "Flood": 2}));
        assert_eq!(heatmap[1].location_name, "Mumbai");
    }

    #[tokio::test]
    async fn skips_records_with_unusable_coordinates() {
        let store = MemoryStore::with_records(
            "location_name",
            100,
            vec![
                record(json!({"location_name": "no-coords"})),
                record(json!({"location_name": "bad-lat", "lat": "far north", "lon": 10.0})),
                record(json!({"location_name": "ok", "lat": "33.7", "lon": -84.4})),
            ],
        );

        let heatmap = build_heatmap(&store).await.unwrap();
        assert_eq!(heatmap.len(), 1);
        assert_eq!(heatmap[0].location_name, "ok");
        assert!((heatmap[0].lat - 33.7).abs() < 1e-12);
    }

    #[tokio::test]
    async fn missing_counters_yield_zero_intensity() {
        let store = MemoryStore::with_records(
            "location_name",
            100,
            vec![record(json!({"location_name": "quiet", "lat": 1.0, "lon": 2.0}))],
        );

        let heatmap = build_heatmap(&store).await.unwrap();
        assert_eq!(heatmap[0].intensity, 0.0);
        assert_eq!(heatmap[0].disaster_breakdown, json!({}));
        assert_eq!(heatmap[0].top_posts, json!([]));
    }

    #[tokio::test]
    async fn unnamed_records_render_as_null() {
        let store = MemoryStore::with_records(
            "location_name",
            100,
            vec![record(json!({"lat": 1.0, "lon": 2.0}))],
        );

        let heatmap = build_heatmap(&store).await.unwrap();
        assert_eq!(heatmap[0].location_name, "NULL");
    }
}
