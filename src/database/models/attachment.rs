use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Attachments,
    Thumbnail,
    Draft,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Attachments => "attachments",
            FileType::Thumbnail => "thumbnail",
            FileType::Draft => "draft",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "attachments" => Some(FileType::Attachments),
            "thumbnail" => Some(FileType::Thumbnail),
            "draft" => Some(FileType::Draft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttachmentRecord {
    pub id: i32,
    pub project_id: i32,
    pub file_name: String,
    pub file_type: String,
    pub key: String,
    pub file_size: Option<i64>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: Option<i32>,
    pub key: String,
    pub url: String,
}
