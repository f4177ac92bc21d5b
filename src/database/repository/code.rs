use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::database::error::{SqlError, SqlResultExt};
use crate::database::models::code::{AllCodeSets, Code, InvestmentActionCategoryCode, IucnSubclassificationCode};
use crate::database::sql::SqlStatement;

/// Code tables are read straight from the pool so that each set can be
/// fetched concurrently on its own connection.
pub struct CodeRepository<'p> {
    pool: &'p PgPool,
}

impl<'p> CodeRepository<'p> {
    pub fn new(pool: &'p PgPool) -> Self {
        Self { pool }
    }

    async fn fetch<T>(&self, sql: &'static str, origin: &str) -> Result<Vec<T>, SqlError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        SqlStatement::new(sql).fetch_all(self.pool).await.origin(origin)
    }

    pub async fn funding_source(&self) -> Result<Vec<Code>, SqlError> {
        self.fetch(
            "SELECT funding_source_id AS id, name FROM funding_source WHERE record_end_date IS NULL ORDER BY name",
            "CodeRepository->funding_source",
        )
        .await
    }

    pub async fn investment_action_category(&self) -> Result<Vec<InvestmentActionCategoryCode>, SqlError> {
        self.fetch(
            "SELECT investment_action_category_id AS id, funding_source_id, name FROM investment_action_category ORDER BY name",
            "CodeRepository->investment_action_category",
        )
        .await
    }

    pub async fn iucn_level_1(&self) -> Result<Vec<Code>, SqlError> {
        self.fetch(
            "SELECT iucn_conservation_action_level_1_classification_id AS id, name \
             FROM iucn_conservation_action_level_1_classification ORDER BY id",
            "CodeRepository->iucn_level_1",
        )
        .await
    }

    pub async fn iucn_level_2(&self) -> Result<Vec<IucnSubclassificationCode>, SqlError> {
        self.fetch(
            "SELECT iucn_conservation_action_level_2_subclassification_id AS id, \
             iucn_conservation_action_level_1_classification_id AS iucn_id, name \
             FROM iucn_conservation_action_level_2_subclassification ORDER BY id",
            "CodeRepository->iucn_level_2",
        )
        .await
    }

    pub async fn iucn_level_3(&self) -> Result<Vec<IucnSubclassificationCode>, SqlError> {
        self.fetch(
            "SELECT iucn_conservation_action_level_3_subclassification_id AS id, \
             iucn_conservation_action_level_2_subclassification_id AS iucn_id, name \
             FROM iucn_conservation_action_level_3_subclassification ORDER BY id",
            "CodeRepository->iucn_level_3",
        )
        .await
    }

    pub async fn system_roles(&self) -> Result<Vec<Code>, SqlError> {
        self.fetch(
            "SELECT system_role_id AS id, name FROM system_role WHERE record_end_date IS NULL ORDER BY id",
            "CodeRepository->system_roles",
        )
        .await
    }

    pub async fn project_roles(&self) -> Result<Vec<Code>, SqlError> {
        self.fetch(
            "SELECT project_role_id AS id, name FROM project_role WHERE record_end_date IS NULL ORDER BY id",
            "CodeRepository->project_roles",
        )
        .await
    }

    pub async fn administrative_activity_status_type(&self) -> Result<Vec<Code>, SqlError> {
        self.fetch(
            "SELECT administrative_activity_status_type_id AS id, name FROM administrative_activity_status_type ORDER BY id",
            "CodeRepository->administrative_activity_status_type",
        )
        .await
    }

    pub async fn ranges(&self) -> Result<Vec<Code>, SqlError> {
        self.fetch("SELECT range_id AS id, name FROM ranges ORDER BY name", "CodeRepository->ranges")
            .await
    }

    /// Fetch every code set concurrently; the first failure wins.
    pub async fn all_code_sets(&self) -> Result<AllCodeSets, SqlError> {
        let (
            funding_source,
            investment_action_category,
            iucn_level_1,
            iucn_level_2,
            iucn_level_3,
            system_roles,
            project_roles,
            activity_status,
            ranges,
        ) = tokio::try_join!(
            self.funding_source(),
            self.investment_action_category(),
            self.iucn_level_1(),
            self.iucn_level_2(),
            self.iucn_level_3(),
            self.system_roles(),
            self.project_roles(),
            self.administrative_activity_status_type(),
            self.ranges(),
        )?;

        Ok(AllCodeSets {
            funding_source,
            investment_action_category,
            iucn_conservation_action_level_1_classification: iucn_level_1,
            iucn_conservation_action_level_2_subclassification: iucn_level_2,
            iucn_conservation_action_level_3_subclassification: iucn_level_3,
            system_roles,
            project_roles,
            administrative_activity_status_type: activity_status,
            ranges,
        })
    }
}
