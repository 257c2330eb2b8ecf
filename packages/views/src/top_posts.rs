//! Top-post expansion for a single location aggregate.
//!
//! Aggregates carry an ordered list of post ids denormalized onto the
//! location record; this resolves them back into full post bodies.

use disaster_map_models::{PostIdEntry, Record};
use disaster_map_store::DocumentStore;
use serde::Serialize;
use serde_json::Value;

use crate::{ViewError, normalize_record};

/// One resolved entry of a location's top post list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TopPost {
    /// The full post body.
    Post(Record),
    /// Marker for a post id with no row in the post store.
    Missing(String),
}

/// Expands a location's ordered top post id list into post bodies.
///
/// Id entries are normalized through [`PostIdEntry`]; unrecognized
/// shapes are dropped. A post id with no backing row yields a
/// [`TopPost::Missing`] marker in its place — one dangling reference
/// must not abort resolution of the rest. Id order is preserved.
///
/// # Errors
///
/// [`ViewError::NotFound`] when the location aggregate is absent,
/// [`ViewError::Store`] when a store call fails.
pub async fn resolve_top_posts(
    locations: &dyn DocumentStore,
    posts: &dyn DocumentStore,
    location_name: &str,
) -> Result<Vec<TopPost>, ViewError> {
    let aggregate = locations
        .get_item(location_name)
        .await?
        .ok_or(ViewError::NotFound)?;

    let entries = aggregate
        .get("top_posts")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let ids: Vec<PostIdEntry> = entries.iter().filter_map(PostIdEntry::parse).collect();

    let mut resolved = Vec::with_capacity(ids.len());
    for entry in &ids {
        match posts.get_item(entry.id()).await? {
            Some(post) => resolved.push(TopPost::Post(normalize_record(post))),
            None => {
                log::warn!("Top post {} for '{location_name}' has no post record", entry.id());
                resolved.push(TopPost::Missing(format!("Post {} not found", entry.id())));
            }
        }
    }

    Ok(resolved)
}
