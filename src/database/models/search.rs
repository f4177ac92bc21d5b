use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Raw search row; `geometry` is the GeoJSON text of the project boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SearchRow {
    pub id: i32,
    pub name: String,
    pub geometry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicSearchRow {
    pub id: i32,
    pub name: String,
    pub geometry: Option<String>,
    /// Mask component features, each carrying `properties.mask`.
    pub mask: Option<Value>,
}
