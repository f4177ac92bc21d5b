use serde_json::Value;

use crate::auth::AuthPrincipal;
use crate::database::connection::DbConnection;
use crate::database::models::search::{PublicSearchRow, SearchResult, SearchRow};
use crate::database::repository::search::SearchRepository;
use crate::error::{ApiError, ApiResult};
use crate::spatial::apply_mask;

use super::require_system_user_id;

fn parse_geometry(id: i32, geometry: Option<&str>) -> ApiResult<Option<Vec<Value>>> {
    geometry
        .map(|text| {
            serde_json::from_str::<Value>(text)
                .map(|parsed| vec![parsed])
                .map_err(|e| ApiError::internal_server_error(format!("Invalid geometry for project {}: {}", id, e)))
        })
        .transpose()
}

/// A GeoJSON text column becomes `[parsed]`; a null column stays absent.
pub fn extract_search_results(rows: Vec<SearchRow>) -> ApiResult<Vec<SearchResult>> {
    rows.into_iter()
        .map(|row| {
            Ok(SearchResult {
                geometry: parse_geometry(row.id, row.geometry.as_deref())?,
                id: row.id,
                name: row.name,
            })
        })
        .collect()
}

/// Like [`extract_search_results`], except a project with mask features is
/// published as the masked circles instead of its boundary.
pub fn extract_public_results(rows: Vec<PublicSearchRow>) -> ApiResult<Vec<SearchResult>> {
    rows.into_iter()
        .map(|row| {
            let masked = match row.mask {
                Some(Value::Array(mut features)) if !features.is_empty() => {
                    for feature in features.iter_mut() {
                        apply_mask(feature).map_err(|e| {
                            ApiError::internal_server_error(format!("Project {}: {}", row.id, e))
                        })?;
                    }
                    Some(
                        features
                            .into_iter()
                            .map(|mut f| f.get_mut("geometry").map(Value::take).unwrap_or(Value::Null))
                            .collect(),
                    )
                }
                _ => None,
            };
            let geometry = match masked {
                Some(circles) => Some(circles),
                None => parse_geometry(row.id, row.geometry.as_deref())?,
            };
            Ok(SearchResult {
                id: row.id,
                name: row.name,
                geometry,
            })
        })
        .collect()
}

pub struct SearchService<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> SearchService<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub async fn search(&mut self, principal: &AuthPrincipal) -> ApiResult<Vec<SearchResult>> {
        let participant = if principal.sees_all_projects() {
            None
        } else {
            Some(require_system_user_id(principal.system_user_id)?)
        };
        let rows = SearchRepository::new(self.conn).search(participant).await?;
        extract_search_results(rows)
    }

    pub async fn public_search(&mut self) -> ApiResult<Vec<SearchResult>> {
        let rows = SearchRepository::new(self.conn).public_search().await?;
        extract_public_results(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn geometry_text_becomes_a_one_element_array() {
        let rows = vec![
            SearchRow {
                id: 1,
                name: "Caribou".into(),
                geometry: Some(r#"{"type":"Point","coordinates":[-123.4,48.4]}"#.into()),
            },
            SearchRow {
                id: 2,
                name: "Wetland".into(),
                geometry: None,
            },
        ];
        let results = extract_search_results(rows).unwrap();

        assert_eq!(
            results[0].geometry,
            Some(vec![json!({"type": "Point", "coordinates": [-123.4, 48.4]})])
        );
        assert_eq!(results[1].geometry, None);

        let serialized = serde_json::to_value(&results[1]).unwrap();
        assert!(serialized.get("geometry").is_none());
    }

    #[test]
    fn public_results_use_mask_circles() {
        let rows = vec![PublicSearchRow {
            id: 3,
            name: "Hidden nest".into(),
            geometry: Some(r#"{"type":"Point","coordinates":[-123.4,48.4]}"#.into()),
            mask: Some(json!([{
                "type": "Feature",
                "properties": {"mask": {"centroid": [-123.0, 48.0], "radius": 1000}},
                "geometry": {"type": "Point", "coordinates": [-123.4, 48.4]}
            }])),
        }];
        let results = extract_public_results(rows).unwrap();
        let geometry = results[0].geometry.as_ref().unwrap();
        assert_eq!(geometry.len(), 1);
        assert_eq!(geometry[0]["type"], "Polygon");
    }

    #[test]
    fn malformed_masks_are_errors() {
        let rows = vec![PublicSearchRow {
            id: 4,
            name: "Broken".into(),
            geometry: None,
            mask: Some(json!([{
                "type": "Feature",
                "properties": {"mask": {"centroid": "nowhere"}},
                "geometry": {"type": "Point", "coordinates": [0, 0]}
            }])),
        }];
        assert_eq!(extract_public_results(rows).unwrap_err().status_code(), 500);
    }
}
