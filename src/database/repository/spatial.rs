use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::project::{LocationPayload, SpatialRecord};
use crate::database::sql::SqlStatement;
use crate::spatial::geography_sql;

pub struct SpatialRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> SpatialRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    /// `None` when there is no project or no geometry to store.
    pub fn insert_statement(project_id: Option<i32>, location: Option<&LocationPayload>) -> Option<SqlStatement> {
        let (project_id, location) = (project_id?, location?);
        let geography = geography_sql(&location.geometry)?;

        let mut stmt = SqlStatement::new(
            "INSERT INTO project_spatial_component (project_id, component_type, name, geojson, number_sites, size_ha, \
             is_within_overlapping, geography) VALUES (",
        );
        stmt.push_bind(project_id)
            .push_sql(", ")
            .push_bind(location.component_type.clone().unwrap_or_else(|| "Boundary".to_string()))
            .push_sql(", ")
            .push_bind(location.name.clone())
            .push_sql(", ")
            .push_bind(serde_json::Value::Array(location.geometry.clone()))
            .push_sql(", ")
            .push_bind(location.number_sites)
            .push_sql(", ")
            .push_bind(location.size_ha)
            .push_sql(", ")
            .push_bind(location.is_within_overlapping.clone())
            .push_sql(", ")
            .append(geography)
            .push_sql(") RETURNING project_spatial_component_id");
        Some(stmt)
    }

    pub async fn insert(&mut self, project_id: i32, location: &LocationPayload) -> Result<Option<i32>, SqlError> {
        let Some(stmt) = Self::insert_statement(Some(project_id), Some(location)) else {
            return Ok(None);
        };
        let (id,): (i32,) = self
            .conn
            .fetch_one(&stmt, "Failed to insert project spatial component")
            .await
            .origin("SpatialRepository->insert")?;
        Ok(Some(id))
    }

    pub async fn list(&mut self, project_id: i32) -> Result<Vec<SpatialRecord>, SqlError> {
        let mut stmt = SqlStatement::new(
            "SELECT project_spatial_component_id, component_type, name, geojson, number_sites, size_ha, \
             is_within_overlapping FROM project_spatial_component WHERE project_id = ",
        );
        stmt.push_bind(project_id).push_sql(" ORDER BY project_spatial_component_id");
        self.conn.fetch_all(&stmt).await.origin("SpatialRepository->list")
    }

    pub async fn delete_all(&mut self, project_id: i32) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("DELETE FROM project_spatial_component WHERE project_id = ");
        stmt.push_bind(project_id);
        self.conn.execute(&stmt).await.origin("SpatialRepository->delete_all")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn geometry_binds_follow_the_component_values() {
        let location = LocationPayload {
            geometry: vec![
                json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]}}),
                json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [3, 4]}}),
            ],
            ..Default::default()
        };
        let stmt = SpatialRepository::insert_statement(Some(7), Some(&location)).unwrap();
        assert_eq!(stmt.param_count(), 9);
        assert!(stmt.sql().contains("public.ST_Force2D(public.ST_GeomFromGeoJSON($8)), public.ST_Force2D(public.ST_GeomFromGeoJSON($9))"));
    }

    #[test]
    fn empty_geometry_builds_nothing() {
        assert!(SpatialRepository::insert_statement(Some(7), Some(&LocationPayload::default())).is_none());
        assert!(SpatialRepository::insert_statement(None, None).is_none());
    }
}
