//! Breaking view: the most recently updated location aggregates.

use disaster_map_models::Record;
use disaster_map_store::{DocumentStore, scan_all};
use serde_json::Value;

use crate::{ViewError, normalize_record};

/// Default number of breaking records returned.
pub const DEFAULT_BREAKING_LIMIT: usize = 10;

/// Returns the `limit` most recently updated location aggregates.
///
/// Recency is the string representation of `updated_at`, descending,
/// with missing values sorting last (ISO timestamps make string order
/// chronological). The sort is stable, so ties keep store scan order.
///
/// # Errors
///
/// Returns [`ViewError::Store`] if the scan fails.
pub async fn latest_disasters(
    locations: &dyn DocumentStore,
    limit: usize,
) -> Result<Vec<Record>, ViewError> {
    let mut records = scan_all(locations, None).await?;
    records.sort_by(|a, b| updated_at_key(b).cmp(&updated_at_key(a)));
    records.truncate(limit);

    Ok(records.into_iter().map(normalize_record).collect())
}

fn updated_at_key(record: &Record) -> String {
    match record.get("updated_at") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
