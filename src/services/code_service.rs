use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::error::SqlError;
use crate::database::models::code::AllCodeSets;
use crate::database::repository::code::CodeRepository;
use crate::error::{ApiError, ApiResult};

/// Source of the form code tables.
#[async_trait]
pub trait CodeSetSource: Send + Sync {
    async fn all_code_sets(&self) -> Result<Option<AllCodeSets>, SqlError>;
}

#[async_trait]
impl CodeSetSource for PgPool {
    async fn all_code_sets(&self) -> Result<Option<AllCodeSets>, SqlError> {
        CodeRepository::new(self).all_code_sets().await.map(Some)
    }
}

/// A source that produced nothing is a server fault.
pub async fn fetch_codes<S: CodeSetSource + ?Sized>(source: &S) -> ApiResult<AllCodeSets> {
    source
        .all_code_sets()
        .await?
        .ok_or_else(|| ApiError::internal_server_error("Failed to fetch codes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::code::Code;

    struct Fixed(Option<AllCodeSets>);

    #[async_trait]
    impl CodeSetSource for Fixed {
        async fn all_code_sets(&self) -> Result<Option<AllCodeSets>, SqlError> {
            Ok(self.0.clone())
        }
    }

    fn sample() -> AllCodeSets {
        AllCodeSets {
            funding_source: vec![Code { id: 1, name: "Provincial".into() }],
            investment_action_category: vec![],
            iucn_conservation_action_level_1_classification: vec![],
            iucn_conservation_action_level_2_subclassification: vec![],
            iucn_conservation_action_level_3_subclassification: vec![],
            system_roles: vec![Code { id: 1, name: "System Administrator".into() }],
            project_roles: vec![],
            administrative_activity_status_type: vec![],
            ranges: vec![],
        }
    }

    #[tokio::test]
    async fn returns_exactly_what_the_source_resolved() {
        let codes = fetch_codes(&Fixed(Some(sample()))).await.unwrap();
        assert_eq!(codes, sample());
    }

    #[tokio::test]
    async fn empty_source_is_a_server_error() {
        let err = fetch_codes(&Fixed(None)).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Failed to fetch codes");
    }
}
