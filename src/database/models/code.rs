use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Code {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct IucnSubclassificationCode {
    pub id: i32,
    pub iucn_id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InvestmentActionCategoryCode {
    pub id: i32,
    pub funding_source_id: i32,
    pub name: String,
}

/// Every code table the forms need, fetched together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllCodeSets {
    pub funding_source: Vec<Code>,
    pub investment_action_category: Vec<InvestmentActionCategoryCode>,
    pub iucn_conservation_action_level_1_classification: Vec<Code>,
    pub iucn_conservation_action_level_2_subclassification: Vec<IucnSubclassificationCode>,
    pub iucn_conservation_action_level_3_subclassification: Vec<IucnSubclassificationCode>,
    pub system_roles: Vec<Code>,
    pub project_roles: Vec<Code>,
    pub administrative_activity_status_type: Vec<Code>,
    pub ranges: Vec<Code>,
}
