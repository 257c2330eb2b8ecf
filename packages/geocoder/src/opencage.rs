//! OpenCage forward geocoder client.
//!
//! Free-text queries against the OpenCage `/geocode/v1/json` endpoint,
//! limited to the single best match. Requires an API key in the
//! `OPENCAGE_KEY` environment variable.
//!
//! See <https://opencagedata.com/api>

use std::time::Duration;

use async_trait::async_trait;
use disaster_map_models::GeocodeResult;

use crate::{GeocodeError, Geocoder};

/// Default OpenCage API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";

/// Request timeout. The upstream has no SLA; expiry surfaces as a
/// transport error instead of hanging the request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenCage HTTP client.
pub struct OpenCageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenCageClient {
    /// Creates a client for the given endpoint and API key.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Creates a client against the public endpoint with the key from
    /// the `OPENCAGE_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::MissingApiKey`] if the variable is unset
    /// or empty.
    pub fn from_env() -> Result<Self, GeocodeError> {
        let api_key = std::env::var("OPENCAGE_KEY").unwrap_or_default();
        if api_key.is_empty() {
            return Err(GeocodeError::MissingApiKey);
        }
        Self::new(DEFAULT_BASE_URL, &api_key)
    }
}

#[async_trait]
impl Geocoder for OpenCageClient {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("key", &self.api_key), ("limit", "1")])
            .send()
            .await?;

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_response(&body)
    }
}

/// Parses an OpenCage JSON response into the best match.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodeResult>, GeocodeError> {
    let results = body["results"].as_array().ok_or_else(|| GeocodeError::Parse {
        message: "OpenCage response has no results array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["geometry"]["lat"]
        .as_f64()
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing geometry.lat in OpenCage response".to_string(),
        })?;

    let lon = first["geometry"]["lng"]
        .as_f64()
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing geometry.lng in OpenCage response".to_string(),
        })?;

    let formatted = first["formatted"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    Ok(Some(GeocodeResult {
        formatted,
        lat,
        lon,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_opencage_result() {
        let body = serde_json::json!({
            "results": [{
                "formatted": "Atlanta, Georgia, United States",
                "geometry": {"lat": 33.7489924, "lng": -84.3902644}
            }]
        });
        let result = parse_response(&body).unwrap().unwrap();
        assert_eq!(result.formatted, "Atlanta, Georgia, United States");
        assert!((result.lat - 33.7489924).abs() < 1e-6);
        assert!((result.lon - -84.3902644).abs() < 1e-6);
    }

    #[test]
    fn parses_empty_results_as_no_match() {
        let body = serde_json::json!({"results": []});
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn missing_results_array_is_a_parse_error() {
        let body = serde_json::json!({"status": {"code": 200}});
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GeocodeError::Parse { .. }));
    }

    #[test]
    fn missing_geometry_is_a_parse_error() {
        let body = serde_json::json!({
            "results": [{"formatted": "Somewhere"}]
        });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GeocodeError::Parse { .. }));
    }
}
