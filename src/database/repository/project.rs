use crate::database::connection::DbConnection;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::project::{ProjectDetails, ProjectListItem, ProjectRecord, ProjectState};
use crate::database::sql::SqlStatement;

const PROJECT_COLUMNS: &str = "SELECT project_id, is_project, name, objectives, state_code, start_date, end_date, \
     is_healing_land, is_healing_people, is_land_initiative, is_cultural_initiative, people_involved, \
     publish_timestamp, create_date, revision_count FROM project";

pub struct ProjectRepository<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> ProjectRepository<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub fn insert_statement(details: &ProjectDetails, is_project: bool, create_user: Option<i32>) -> SqlStatement {
        let mut stmt = SqlStatement::new(
            "INSERT INTO project (is_project, name, objectives, state_code, start_date, end_date, \
             is_healing_land, is_healing_people, is_land_initiative, is_cultural_initiative, people_involved, \
             create_user) VALUES (",
        );
        stmt.push_bind(is_project)
            .push_sql(", ")
            .push_bind(details.name.trim())
            .push_sql(", ")
            .push_bind(details.objectives.clone())
            .push_sql(", ")
            .push_bind(ProjectState::Draft.code())
            .push_sql(", ")
            .push_bind(details.start_date)
            .push_sql(", ")
            .push_bind(details.end_date)
            .push_sql(", ")
            .push_bind(details.is_healing_land)
            .push_sql(", ")
            .push_bind(details.is_healing_people)
            .push_sql(", ")
            .push_bind(details.is_land_initiative)
            .push_sql(", ")
            .push_bind(details.is_cultural_initiative)
            .push_sql(", ")
            .push_bind(details.people_involved)
            .push_sql(", ")
            .push_bind(create_user)
            .push_sql(") RETURNING project_id");
        stmt
    }

    pub async fn insert(&mut self, details: &ProjectDetails, is_project: bool) -> Result<i32, SqlError> {
        let stmt = Self::insert_statement(details, is_project, self.conn.system_user_id());
        let (project_id,): (i32,) = self
            .conn
            .fetch_one(&stmt, "Failed to insert project")
            .await
            .origin("ProjectRepository->insert")?;
        Ok(project_id)
    }

    pub async fn get(&mut self, project_id: i32) -> Result<Option<ProjectRecord>, SqlError> {
        let mut stmt = SqlStatement::new(PROJECT_COLUMNS);
        stmt.push_sql(" WHERE project_id = ").push_bind(project_id);
        self.conn.fetch_optional(&stmt).await.origin("ProjectRepository->get")
    }

    /// Optimistic update: affects no row when `revision_count` is stale.
    pub async fn update_details(
        &mut self,
        project_id: i32,
        details: &ProjectDetails,
        revision_count: i32,
    ) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("UPDATE project SET name = ");
        stmt.push_bind(details.name.trim())
            .push_sql(", objectives = ")
            .push_bind(details.objectives.clone())
            .push_sql(", start_date = ")
            .push_bind(details.start_date)
            .push_sql(", end_date = ")
            .push_bind(details.end_date)
            .push_sql(", is_healing_land = ")
            .push_bind(details.is_healing_land)
            .push_sql(", is_healing_people = ")
            .push_bind(details.is_healing_people)
            .push_sql(", is_land_initiative = ")
            .push_bind(details.is_land_initiative)
            .push_sql(", is_cultural_initiative = ")
            .push_bind(details.is_cultural_initiative)
            .push_sql(", people_involved = ")
            .push_bind(details.people_involved)
            .push_sql(", update_date = now(), revision_count = revision_count + 1 WHERE project_id = ")
            .push_bind(project_id)
            .push_sql(" AND revision_count = ")
            .push_bind(revision_count);
        self.conn.execute(&stmt).await.origin("ProjectRepository->update_details")
    }

    pub async fn set_state(&mut self, project_id: i32, state: ProjectState) -> Result<u64, SqlError> {
        let mut stmt = SqlStatement::new("UPDATE project SET state_code = ");
        stmt.push_bind(state.code());
        match state {
            ProjectState::Published => stmt.push_sql(", publish_timestamp = now()"),
            ProjectState::Draft => stmt.push_sql(", publish_timestamp = NULL"),
            _ => &mut stmt,
        };
        stmt.push_sql(", update_date = now(), revision_count = revision_count + 1 WHERE project_id = ")
            .push_bind(project_id);
        self.conn.execute(&stmt).await.origin("ProjectRepository->set_state")
    }

    pub fn list_statement(is_project: bool, participant: Option<i32>) -> SqlStatement {
        let mut stmt = SqlStatement::new(
            "SELECT p.project_id, p.is_project, p.name, p.state_code, p.start_date, p.end_date FROM project p WHERE p.is_project = ",
        );
        stmt.push_bind(is_project).push_sql(" AND p.state_code <> ").push_bind(ProjectState::Archived.code());
        if let Some(system_user_id) = participant {
            stmt.push_sql(
                " AND EXISTS (SELECT 1 FROM project_participation pp WHERE pp.project_id = p.project_id AND pp.system_user_id = ",
            )
            .push_bind(system_user_id)
            .push_sql(")");
        }
        stmt.push_sql(" ORDER BY p.start_date DESC, p.project_id DESC");
        stmt
    }

    /// `participant` restricts the list to projects that user takes part in.
    pub async fn list(&mut self, is_project: bool, participant: Option<i32>) -> Result<Vec<ProjectListItem>, SqlError> {
        let stmt = Self::list_statement(is_project, participant);
        self.conn.fetch_all(&stmt).await.origin("ProjectRepository->list")
    }
}
