use std::collections::BTreeSet;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::RegionConfig;
use crate::error::ApiError;
use crate::spatial::{bounding_box, BoundingBox};

#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    #[error("Invalid WFS url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("WFS request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("WFS returned status {0}")]
    Status(u16),
}

impl From<RegionError> for ApiError {
    fn from(err: RegionError) -> Self {
        warn!(error = %err, "Region lookup failed");
        match err {
            RegionError::InvalidUrl(_) => ApiError::internal_server_error("Region lookup is misconfigured"),
            _ => ApiError::bad_gateway("Failed to fetch regions"),
        }
    }
}

/// Looks up the natural resource regions a set of features falls in.
#[derive(Debug, Clone)]
pub struct RegionService {
    client: reqwest::Client,
    config: RegionConfig,
}

impl RegionService {
    pub fn from_config(config: &RegionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn get_feature_url(&self, bbox: &BoundingBox) -> Result<Url, RegionError> {
        let mut url = Url::parse(&self.config.wfs_url)?;
        url.query_pairs_mut()
            .append_pair("service", "WFS")
            .append_pair("version", "2.0.0")
            .append_pair("request", "GetFeature")
            .append_pair("typeNames", &self.config.layer_name)
            .append_pair("outputFormat", "application/json")
            .append_pair("srsName", "EPSG:4326")
            .append_pair("propertyName", &self.config.name_property)
            .append_pair(
                "bbox",
                &format!(
                    "{},{},{},{},urn:ogc:def:crs:OGC:1.3:CRS84",
                    bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
                ),
            );
        Ok(url)
    }

    /// Region names intersecting the features' bounding box. No features,
    /// no regions.
    pub async fn regions_for(&self, features: &[Value]) -> Result<Vec<String>, RegionError> {
        let Some(bbox) = bounding_box(features) else {
            return Ok(vec![]);
        };
        let url = self.get_feature_url(&bbox)?;
        debug!(%url, "Requesting regions");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RegionError::Status(response.status().as_u16()));
        }
        let body: Value = response.json().await?;
        Ok(region_names(&body, &self.config.name_property))
    }
}

/// Distinct, sorted names from a GeoJSON feature collection.
pub fn region_names(collection: &Value, name_property: &str) -> Vec<String> {
    let names: BTreeSet<String> = collection
        .get("features")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|feature| feature.get("properties")?.get(name_property)?.as_str())
        .map(str::to_string)
        .collect();
    names.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn config(wfs_url: String) -> RegionConfig {
        RegionConfig {
            wfs_url,
            layer_name: "WHSE_ADMIN_BOUNDARIES.ADM_NR_REGIONS_SPG".into(),
            name_property: "REGION_NAME".into(),
        }
    }

    fn square() -> Value {
        json!({
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "Polygon", "coordinates": [[[-124, 48], [-123, 48], [-123, 49], [-124, 49], [-124, 48]]]}
        })
    }

    #[test]
    fn names_are_distinct_and_sorted() {
        let body = json!({"features": [
            {"properties": {"REGION_NAME": "West Coast"}},
            {"properties": {"REGION_NAME": "South Coast"}},
            {"properties": {"REGION_NAME": "West Coast"}},
            {"properties": {}}
        ]});
        assert_eq!(region_names(&body, "REGION_NAME"), vec!["South Coast", "West Coast"]);
        assert!(region_names(&json!({}), "REGION_NAME").is_empty());
    }

    #[test]
    fn get_feature_url_carries_the_bbox() {
        let service = RegionService::from_config(&config("https://openmaps.example.com/geo/wfs".into()));
        let url = service
            .get_feature_url(&BoundingBox { min_x: -124.0, min_y: 48.0, max_x: -123.0, max_y: 49.0 })
            .unwrap();
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["request"], "GetFeature");
        assert_eq!(pairs["bbox"], "-124,48,-123,49,urn:ogc:def:crs:OGC:1.3:CRS84");
    }

    #[tokio::test]
    async fn queries_the_wfs_layer() {
        async fn wfs(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
            assert_eq!(params.get("typeNames").map(String::as_str), Some("WHSE_ADMIN_BOUNDARIES.ADM_NR_REGIONS_SPG"));
            Json(json!({"type": "FeatureCollection", "features": [{"properties": {"REGION_NAME": "West Coast"}}]}))
        }
        let app = Router::new().route("/wfs", get(wfs));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let service = RegionService::from_config(&config(format!("http://{}/wfs", addr)));
        assert_eq!(service.regions_for(&[square()]).await.unwrap(), vec!["West Coast"]);
        assert!(service.regions_for(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_wfs_is_a_bad_gateway() {
        let service = RegionService::from_config(&config("http://127.0.0.1:1/wfs".into()));
        let err: ApiError = service.regions_for(&[square()]).await.unwrap_err().into();
        assert_eq!(err.status_code(), 502);
    }
}
