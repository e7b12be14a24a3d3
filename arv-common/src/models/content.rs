//! Catalog content and outcome types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    LessonPlan,
    Material,
}

/// Material file type; only interactive types are scorable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    H5p,
    Image,
    Video,
    Audio,
    Document,
    #[serde(other)]
    Unknown,
}

/// One version of a catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub name: String,
    pub content_type: ContentType,
    #[serde(default = "default_file_type")]
    pub file_type: FileType,
    /// Key the live room reports telemetry under (H5P id); may be empty
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub outcome_ids: Vec<String>,
}

fn default_file_type() -> FileType {
    FileType::Unknown
}

/// Learning objective
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub id: String,
    pub name: String,
    /// Defaults to achieved when no explicit record exists
    #[serde(default)]
    pub assumed: bool,
}
