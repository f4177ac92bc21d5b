use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::project::ProjectState;
use crate::database::models::search::{PublicSearchRow, SearchRow};
use crate::database::sql::SqlStatement;

pub struct SearchRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> SearchRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    /// `participant` limits results to that user's projects.
    pub fn search_statement(participant: Option<i32>) -> SqlStatement {
        let mut stmt = SqlStatement::new(
            "SELECT p.project_id AS id, p.name, \
             (SELECT public.ST_AsGeoJSON(public.ST_Collect(psc.geography::geometry)) \
                FROM project_spatial_component psc \
               WHERE psc.project_id = p.project_id AND psc.component_type = 'Boundary') AS geometry \
             FROM project p WHERE p.is_project AND p.state_code <> ",
        );
        stmt.push_bind(ProjectState::Archived.code());
        if let Some(system_user_id) = participant {
            stmt.push_sql(
                " AND EXISTS (SELECT 1 FROM project_participation pp WHERE pp.project_id = p.project_id AND pp.system_user_id = ",
            )
            .push_bind(system_user_id)
            .push_sql(")");
        }
        stmt.push_sql(" ORDER BY p.project_id");
        stmt
    }

    pub async fn search(&mut self, participant: Option<i32>) -> Result<Vec<SearchRow>, SqlError> {
        let stmt = Self::search_statement(participant);
        self.conn.fetch_all(&stmt).await.origin("SearchRepository->search")
    }

    /// Published projects, with the features of any mask component.
    pub async fn public_search(&mut self) -> Result<Vec<PublicSearchRow>, SqlError> {
        let mut stmt = SqlStatement::new(
            "SELECT p.project_id AS id, p.name, \
             (SELECT public.ST_AsGeoJSON(public.ST_Collect(psc.geography::geometry)) \
                FROM project_spatial_component psc \
               WHERE psc.project_id = p.project_id AND psc.component_type = 'Boundary') AS geometry, \
             (SELECT jsonb_agg(feature) FROM project_spatial_component psc, jsonb_array_elements(psc.geojson) feature \
               WHERE psc.project_id = p.project_id AND psc.component_type = 'Mask') AS mask \
             FROM project p WHERE p.is_project AND p.state_code = ",
        );
        stmt.push_bind(ProjectState::Published.code()).push_sql(" ORDER BY p.project_id");
        self.conn.fetch_all(&stmt).await.origin("SearchRepository->public_search")
    }
}
