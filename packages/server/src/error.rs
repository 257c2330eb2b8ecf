//! Mapping of core error taxonomies onto HTTP responses.
//!
//! Every error surfaces as a structured `{"error": message}` body.
//! Status mapping: `InvalidArgument` 400, `NotFound` 404, upstream
//! transport failures 500, store-reported operational errors 400 (the
//! store already judged the request, so the message passes through).

use actix_web::HttpResponse;
use disaster_map_search::SearchError;
use disaster_map_store::StoreError;
use disaster_map_views::ViewError;

/// Builds a `{"error": message}` response with the given status.
pub fn error_body(status: actix_web::http::StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": message }))
}

/// Maps a proximity search failure.
pub fn search_error(err: &SearchError) -> HttpResponse {
    use actix_web::http::StatusCode;

    let status = match err {
        SearchError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
        SearchError::NotFound => StatusCode::NOT_FOUND,
        SearchError::UpstreamUnavailable { .. } | SearchError::Store { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_body(status, &err.to_string())
}

/// Maps a view failure.
pub fn view_error(err: &ViewError) -> HttpResponse {
    use actix_web::http::StatusCode;

    let status = match err {
        ViewError::NotFound => StatusCode::NOT_FOUND,
        ViewError::Store(StoreError::Operation { .. }) => StatusCode::BAD_REQUEST,
        ViewError::Store(StoreError::Unavailable { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_body(status, &err.to_string())
}

/// Maps a store failure from the CRUD surface.
pub fn store_error(err: &StoreError) -> HttpResponse {
    use actix_web::http::StatusCode;

    let status = match err {
        StoreError::Operation { .. } => StatusCode::BAD_REQUEST,
        StoreError::Unavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_body(status, &err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_errors_map_to_expected_statuses() {
        let invalid = SearchError::InvalidArgument {
            message: "Missing 'search' parameter".to_string(),
        };
        assert_eq!(search_error(&invalid).status(), 400);
        assert_eq!(search_error(&SearchError::NotFound).status(), 404);

        let upstream = SearchError::UpstreamUnavailable {
            message: "timeout".to_string(),
        };
        assert_eq!(search_error(&upstream).status(), 500);
    }

    #[test]
    fn store_errors_split_on_origin() {
        let operational = StoreError::Operation {
            message: "The conditional request failed".to_string(),
        };
        assert_eq!(store_error(&operational).status(), 400);

        let transport = StoreError::Unavailable {
            message: "dispatch failure".to_string(),
        };
        assert_eq!(store_error(&transport).status(), 500);
    }

    #[test]
    fn view_not_found_is_404() {
        assert_eq!(view_error(&ViewError::NotFound).status(), 404);
    }
}
