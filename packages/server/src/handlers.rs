//! HTTP handler functions for the disaster map API.

use actix_web::{HttpResponse, web};
use disaster_map_models::value;
use disaster_map_store::scan_all;
use disaster_map_views::{archive, breaking, heatmap, top_posts};
use serde::Deserialize;

use crate::AppState;
use crate::error::{error_body, search_error, store_error, view_error};

/// `GET /api/status`
pub async fn status() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "Service is operational",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Query parameters for `GET /api/post`.
#[derive(Debug, Deserialize)]
pub struct PostQueryParams {
    /// Post identifier.
    #[serde(rename = "postID")]
    pub post_id: Option<String>,
}

/// `GET /api/post?postID=...`
pub async fn get_post(
    state: web::Data<AppState>,
    params: web::Query<PostQueryParams>,
) -> HttpResponse {
    let Some(post_id) = params.post_id.as_deref().filter(|id| !id.is_empty()) else {
        return error_body(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Missing 'postID' parameter",
        );
    };

    match state.posts.get_item(post_id).await {
        Ok(item) => HttpResponse::Ok().json(item),
        Err(e) => {
            log::error!("Failed to get post {post_id}: {e}");
            store_error(&e)
        }
    }
}

/// `GET /api/posts`
///
/// Drains the full paginated scan of the post table; the store's page
/// limit never truncates the response.
pub async fn get_posts(state: web::Data<AppState>) -> HttpResponse {
    match scan_all(state.posts.as_ref(), None).await {
        Ok(records) => {
            let posts: Vec<serde_json::Value> = records
                .into_iter()
                .map(|r| value::normalize(serde_json::Value::Object(r)))
                .collect();
            HttpResponse::Ok().json(serde_json::json!({ "posts": posts }))
        }
        Err(e) => {
            log::error!("Failed to scan posts: {e}");
            store_error(&e)
        }
    }
}

/// `POST /api/post`
pub async fn save_post(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    let Some(record) = body.as_object().cloned() else {
        return error_body(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Request body must be a JSON object",
        );
    };

    match state.posts.put_item(record.clone()).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "Operation": "SAVE",
            "Message": "SUCCESS",
            "Item": record,
        })),
        Err(e) => {
            log::error!("Failed to save post: {e}");
            store_error(&e)
        }
    }
}

/// Body of `PATCH /api/post`.
#[derive(Debug, Deserialize)]
pub struct ModifyPostBody {
    /// Post identifier.
    #[serde(rename = "postId")]
    pub post_id: String,
    /// Field to set.
    #[serde(rename = "updateKey")]
    pub update_key: String,
    /// New value for the field.
    #[serde(rename = "updateValue")]
    pub update_value: serde_json::Value,
}

/// `PATCH /api/post`
pub async fn modify_post(
    state: web::Data<AppState>,
    body: web::Json<ModifyPostBody>,
) -> HttpResponse {
    let body = body.into_inner();
    match state
        .posts
        .update_item(&body.post_id, &body.update_key, body.update_value)
        .await
    {
        Ok(updated) => HttpResponse::Ok().json(serde_json::json!({
            "Operation": "UPDATE",
            "Message": "SUCCESS",
            "UpdatedAttributes": updated,
        })),
        Err(e) => {
            log::error!("Failed to modify post {}: {e}", body.post_id);
            store_error(&e)
        }
    }
}

/// Body of `DELETE /api/post`.
#[derive(Debug, Deserialize)]
pub struct DeletePostBody {
    /// Post identifier.
    #[serde(rename = "postId")]
    pub post_id: String,
}

/// `DELETE /api/post`
pub async fn delete_post(
    state: web::Data<AppState>,
    body: web::Json<DeletePostBody>,
) -> HttpResponse {
    match state.posts.delete_item(&body.post_id).await {
        Ok(removed) => HttpResponse::Ok().json(serde_json::json!({
            "Operation": "DELETE",
            "Message": "SUCCESS",
            "Item": removed,
        })),
        Err(e) => {
            log::error!("Failed to delete post {}: {e}", body.post_id);
            store_error(&e)
        }
    }
}

/// `GET /api/heatmap`
pub async fn get_heatmap(state: web::Data<AppState>) -> HttpResponse {
    match heatmap::build_heatmap(state.locations.as_ref()).await {
        Ok(locations) => HttpResponse::Ok().json(serde_json::json!({
            "heatmap_locations": locations,
        })),
        Err(e) => {
            log::error!("Failed to build heatmap: {e}");
            view_error(&e)
        }
    }
}

/// Query parameters for `GET /api/search-location`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Free-text place query.
    pub search: Option<String>,
}

/// `GET /api/search-location?search=...`
pub async fn search_location(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> HttpResponse {
    let query = params.search.as_deref().unwrap_or_default();

    match state.search.search_near(query).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => {
            log::error!("Search for '{query}' failed: {e}");
            search_error(&e)
        }
    }
}

/// Query parameters for `GET /api/top-posts`.
#[derive(Debug, Deserialize)]
pub struct TopPostsParams {
    /// Location aggregate name.
    pub location: Option<String>,
}

/// `GET /api/top-posts?location=...`
pub async fn get_top_posts(
    state: web::Data<AppState>,
    params: web::Query<TopPostsParams>,
) -> HttpResponse {
    let Some(location) = params.location.as_deref().filter(|l| !l.is_empty()) else {
        return error_body(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Missing 'location' parameter",
        );
    };

    match top_posts::resolve_top_posts(state.locations.as_ref(), state.posts.as_ref(), location)
        .await
    {
        Ok(posts) => HttpResponse::Ok().json(serde_json::json!({
            "location_name": location,
            "top_posts": posts,
        })),
        Err(e) => {
            log::error!("Failed to resolve top posts for '{location}': {e}");
            view_error(&e)
        }
    }
}

/// Query parameters for `GET /api/archive`.
#[derive(Debug, Deserialize)]
pub struct ArchiveParams {
    /// Snapshot date filter (e.g. `2024-01-01`).
    pub date: Option<String>,
}

/// `GET /api/archive?date=...`
pub async fn get_archive(
    state: web::Data<AppState>,
    params: web::Query<ArchiveParams>,
) -> HttpResponse {
    match archive::build_archive(state.archive.as_ref(), params.date.as_deref()).await {
        Ok(entries) => HttpResponse::Ok().json(serde_json::json!({
            "archive_locations": entries,
        })),
        Err(e) => {
            log::error!("Failed to build archive view: {e}");
            view_error(&e)
        }
    }
}

/// `GET /api/breaking-disaster`
pub async fn breaking_disasters(state: web::Data<AppState>) -> HttpResponse {
    match breaking::latest_disasters(state.locations.as_ref(), breaking::DEFAULT_BREAKING_LIMIT)
        .await
    {
        Ok(records) => HttpResponse::Ok().json(serde_json::json!({
            "breaking_disasters": records,
        })),
        Err(e) => {
            log::error!("Failed to build breaking view: {e}");
            view_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test};
    use async_trait::async_trait;
    use disaster_map_geocoder::{GeocodeError, Geocoder};
    use disaster_map_models::{GeocodeResult, Record};
    use disaster_map_search::{DEFAULT_RADIUS_MILES, ProximitySearch};
    use disaster_map_store::memory::MemoryStore;
    use serde_json::json;

    use super::*;

    struct StubGeocoder(Option<GeocodeResult>);

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
            Ok(self.0.clone())
        }
    }

    fn record(pairs: serde_json::Value) -> Record {
        pairs.as_object().cloned().unwrap()
    }

    fn state(locations: Vec<Record>, posts: Vec<Record>) -> web::Data<AppState> {
        let locations = Arc::new(MemoryStore::with_records("location_name", 100, locations));
        let posts = Arc::new(MemoryStore::with_records("postID", 100, posts));
        let archive = Arc::new(MemoryStore::new("location_name", 100));
        let geocoder = Arc::new(StubGeocoder(Some(GeocodeResult {
            formatted: "Atlanta, Georgia, United States".to_string(),
            lat: 33.749,
            lon: -84.388,
        })));
        let search = Arc::new(ProximitySearch::new(
            geocoder,
            locations.clone(),
            DEFAULT_RADIUS_MILES,
        ));

        web::Data::new(AppState {
            locations,
            posts,
            archive,
            search,
        })
    }

    #[actix_web::test]
    async fn search_location_returns_hit_and_nearby_records() {
        let state = state(
            vec![
                record(json!({"location_name": "Atlanta", "lat": 33.749, "lon": -84.388})),
                record(json!({"location_name": "Mumbai", "lat": 19.076, "lon": 72.8777})),
            ],
            Vec::new(),
        );
        let app = test::init_service(
            App::new().app_data(state).route(
                "/search-location",
                web::get().to(search_location),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/search-location?search=Atlanta")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            body["search-hit"]["location_name"],
            "Atlanta, Georgia, United States"
        );
        assert!(body["search-hit"]["lat"].is_number());
        let nearby = body["nearby-records"].as_array().unwrap();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0]["location_name"], "Atlanta");
    }

    #[actix_web::test]
    async fn search_location_without_query_is_400() {
        let state = state(Vec::new(), Vec::new());
        let app = test::init_service(
            App::new().app_data(state).route(
                "/search-location",
                web::get().to(search_location),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/search-location").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn heatmap_envelope_wraps_locations() {
        let state = state(
            vec![record(json!({
                "location_name": "Atlanta", "lat": 33.749, "lon": -84.388,
                "avg_score": 2.0, "post_count": 2
            }))],
            Vec::new(),
        );
        let app = test::init_service(
            App::new()
                .app_data(state)
                .route("/heatmap", web::get().to(get_heatmap)),
        )
        .await;

        let req = test::TestRequest::get().uri("/heatmap").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let locations = body["heatmap_locations"].as_array().unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0]["intensity"], json!(4.0));
    }

    #[actix_web::test]
    async fn post_crud_round_trip() {
        let state = state(Vec::new(), Vec::new());
        let app = test::init_service(
            App::new()
                .app_data(state)
                .route("/post", web::get().to(get_post))
                .route("/post", web::post().to(save_post))
                .route("/post", web::patch().to(modify_post))
                .route("/post", web::delete().to(delete_post)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/post")
            .set_json(json!({"postID": "p1", "text": "flooding downtown"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["Operation"], "SAVE");
        assert_eq!(body["Message"], "SUCCESS");

        let req = test::TestRequest::patch()
            .uri("/post")
            .set_json(json!({"postId": "p1", "updateKey": "score", "updateValue": 4}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["UpdatedAttributes"]["score"], json!(4));

        let req = test::TestRequest::get()
            .uri("/post?postID=p1")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["score"], json!(4));

        let req = test::TestRequest::delete()
            .uri("/post")
            .set_json(json!({"postId": "p1"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["Operation"], "DELETE");
        assert_eq!(body["Item"]["postID"], "p1");
    }

    #[actix_web::test]
    async fn top_posts_for_unknown_location_is_404() {
        let state = state(Vec::new(), Vec::new());
        let app = test::init_service(
            App::new()
                .app_data(state)
                .route("/top-posts", web::get().to(get_top_posts)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/top-posts?location=Unknowntown")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}
