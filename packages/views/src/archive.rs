//! Archive view: heatmap shaping over time-snapshotted aggregates.

use disaster_map_models::{ArchiveEntry, Record, value};
use disaster_map_store::{DocumentStore, ScanFilter, scan_all};
use serde_json::Value;

use crate::{ViewError, intensity};

/// Builds the archive view, optionally restricted to one snapshot date.
///
/// Same coordinate and intensity rules as the live heatmap, plus
/// passthrough of the snapshot metadata fields. The date filter is
/// applied server-side (store filter expression), not client-side.
///
/// # Errors
///
/// Returns [`ViewError::Store`] if the scan fails.
pub async fn build_archive(
    archive: &dyn DocumentStore,
    snapshot_date: Option<&str>,
) -> Result<Vec<ArchiveEntry>, ViewError> {
    let filter = snapshot_date.map(|date| ScanFilter::FieldEquals {
        field: "snapshot_date".to_string(),
        value: Value::from(date),
    });

    let records = scan_all(archive, filter.as_ref()).await?;
    Ok(records.iter().filter_map(archive_entry).collect())
}

/// Shapes one snapshot record, or `None` when coordinates are unusable.
fn archive_entry(record: &Record) -> Option<ArchiveEntry> {
    let lat = record.get("lat").and_then(value::as_f64)?;
    let lon = record.get("lon").and_then(value::as_f64)?;

    let string_field = |name: &str| {
        record
            .get(name)
            .and_then(Value::as_str)
            .map(ToString::to_string)
    };

    Some(ArchiveEntry {
        location_name: record
            .get("location_name")
            .and_then(Value::as_str)
            .unwrap_or("NULL")
            .to_string(),
        lat,
        lon,
        disaster_breakdown: value::normalize(
            record
                .get("disaster_breakdown")
                .cloned()
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        ),
        intensity: intensity(record),
        snapshot_date: string_field("snapshot_date"),
        snapshot_ts: string_field("snapshot_ts"),
        archived_at: string_field("archived_at"),
        updated_at: string_field("updated_at"),
        top_post_ids: record.get("top_post_ids").cloned().map(value::normalize),
    })
}

#[cfg(test)]
mod tests {
    use disaster_map_store::memory::MemoryStore;
    use serde_json::json;

    use super::*;

    fn snapshot(name: &str, date: &str) -> Record {
        json!({
            "location_name": name,
            "snapshot_date": date,
            "snapshot_ts": format!("{date}T00:00:00Z"),
            "archived_at": format!("{date}T01:00:00Z"),
            "lat": 33.749, "lon": -84.388,
            "avg_score": 2.0, "post_count": 3,
            "top_post_ids": ["p1", "p2"]
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[tokio::test]
    async fn date_filter_selects_matching_snapshots_only() {
        let store = MemoryStore::with_records(
            "location_name",
            100,
            vec![
                snapshot("Atlanta", "2024-01-01"),
                snapshot("Atlanta", "2024-01-02"),
                snapshot("Mumbai", "2024-01-01"),
            ],
        );

        let entries = build_archive(&store, Some("2024-01-01")).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|e| e.snapshot_date.as_deref() == Some("2024-01-01")));
    }

    #[tokio::test]
    async fn without_a_date_every_snapshot_is_included() {
        let store = MemoryStore::with_records(
            "location_name",
            100,
            vec![
                snapshot("Atlanta", "2024-01-01"),
                snapshot("Atlanta", "2024-01-02"),
            ],
        );

        let entries = build_archive(&store, None).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn snapshot_metadata_passes_through() {
        let store =
            MemoryStore::with_records("location_name", 100, vec![snapshot("Atlanta", "2024-01-01")]);

        let entries = build_archive(&store, None).await.unwrap();
        let entry = &entries[0];
        assert_eq!(entry.snapshot_ts.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(entry.archived_at.as_deref(), Some("2024-01-01T01:00:00Z"));
        assert_eq!(entry.top_post_ids, Some(json!(["p1", "p2"])));
        assert!((entry.intensity - 6.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn snapshots_without_coordinates_are_skipped() {
        let mut broken = snapshot("Nowhere", "2024-01-01");
        broken.remove("lat");
        let store = MemoryStore::with_records("location_name", 100, vec![broken]);

        let entries = build_archive(&store, None).await.unwrap();
        assert!(entries.is_empty());
    }
}
