#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the disaster map application.
//!
//! Serves the REST API consumed by the heatmap frontend: proximity
//! search, heatmap and archive aggregation views, top-post expansion,
//! and the post CRUD surface. All state lives in the external document
//! store; each request runs to completion with no shared mutable state.

mod error;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{App, HttpServer, middleware, web};
use disaster_map_geocoder::opencage::OpenCageClient;
use disaster_map_search::{DEFAULT_RADIUS_MILES, ProximitySearch};
use disaster_map_store::DocumentStore;
use disaster_map_store::dynamo::{DynamoStore, client_from_env};

/// Default table of live location aggregates.
const DEFAULT_LOCATIONS_TABLE: &str = "DisasterHeatmapLocations";
/// Default table of disaster report posts.
const DEFAULT_POSTS_TABLE: &str = "DisasterHeatmapPosts";
/// Default table of append-only archive snapshots.
const DEFAULT_ARCHIVE_TABLE: &str = "DisasterHeatmapArchive";

/// Shared application state.
///
/// Stores and the search engine are constructed once at startup and
/// injected into handlers; nothing here is mutated per-request.
pub struct AppState {
    /// Location aggregate table, keyed by `location_name`.
    pub locations: Arc<dyn DocumentStore>,
    /// Post table, keyed by `postID`.
    pub posts: Arc<dyn DocumentStore>,
    /// Archive snapshot table.
    pub archive: Arc<dyn DocumentStore>,
    /// Proximity search engine over the location table.
    pub search: Arc<ProximitySearch>,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Starts the disaster map API server.
///
/// Builds the `DynamoDB`-backed stores and the OpenCage geocoder from
/// the environment, then serves the API. This is a regular async
/// function — the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
///
/// # Panics
///
/// Panics if `OPENCAGE_KEY` is unset or the geocoder client cannot be
/// constructed.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Connecting to document store...");
    let client = client_from_env().await;

    let locations: Arc<dyn DocumentStore> = Arc::new(DynamoStore::new(
        client.clone(),
        &env_or("DISASTER_TABLE", DEFAULT_LOCATIONS_TABLE),
        "location_name",
    ));
    let posts: Arc<dyn DocumentStore> = Arc::new(DynamoStore::new(
        client.clone(),
        &env_or("POSTS_TABLE", DEFAULT_POSTS_TABLE),
        "postID",
    ));
    let archive: Arc<dyn DocumentStore> = Arc::new(DynamoStore::new(
        client,
        &env_or("ARCHIVE_TABLE", DEFAULT_ARCHIVE_TABLE),
        "location_name",
    ));

    let geocoder = OpenCageClient::from_env().expect("OPENCAGE_KEY must be set");

    let radius_miles: f64 = std::env::var("SEARCH_RADIUS_MILES")
        .ok()
        .and_then(|r| r.parse().ok())
        .unwrap_or(DEFAULT_RADIUS_MILES);
    log::info!("Search radius: {radius_miles} miles");

    let search = Arc::new(ProximitySearch::new(
        Arc::new(geocoder),
        locations.clone(),
        radius_miles,
    ));

    let state = web::Data::new(AppState {
        locations,
        posts,
        archive,
        search,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"]);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/status", web::get().to(handlers::status))
                    .route("/post", web::get().to(handlers::get_post))
                    .route("/post", web::post().to(handlers::save_post))
                    .route("/post", web::patch().to(handlers::modify_post))
                    .route("/post", web::delete().to(handlers::delete_post))
                    .route("/posts", web::get().to(handlers::get_posts))
                    .route("/heatmap", web::get().to(handlers::get_heatmap))
                    .route("/search-location", web::get().to(handlers::search_location))
                    .route("/top-posts", web::get().to(handlers::get_top_posts))
                    .route("/archive", web::get().to(handlers::get_archive))
                    .route(
                        "/breaking-disaster",
                        web::get().to(handlers::breaking_disasters),
                    ),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
