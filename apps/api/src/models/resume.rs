use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub extracted_text: Option<String>,
    /// `StructuredResume` JSON. NULL until the resume has been parsed.
    pub parsed_data: Option<Value>,
    pub ai_analysis: Option<Value>,
    /// Bumped on every stored merge; used for optimistic write checks.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeSummaryRow {
    pub id: Uuid,
    pub filename: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only history of stored versions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeVersionRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub version: i32,
    pub parsed_data: Value,
    /// The plan that produced this version. NULL for the initial version.
    pub change_plan: Option<Value>,
    pub created_at: DateTime<Utc>,
}
