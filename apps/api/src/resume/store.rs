//! Resume persistence.
//!
//! Every stored merge is a new version: the `resumes` row is replaced under an optimistic
//! version check and the new state is appended to `resume_versions`. History rows are
//! never updated.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::resume::{ResumeRow, ResumeSummaryRow, ResumeVersionRow};
use crate::resume::plan::ChangePlan;
use crate::resume::structured::StructuredResume;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("resume {resume_id} is no longer at version {expected_version}")]
    StaleVersion {
        resume_id: Uuid,
        expected_version: i32,
    },

    #[error("could not serialize resume data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A merged resume to store as the next version of `resume_id`.
pub struct VersionedWrite<'a> {
    pub resume_id: Uuid,
    /// The version the merge was computed from. The write is rejected if it moved.
    pub expected_version: i32,
    pub resume: &'a StructuredResume,
    pub plan: &'a ChangePlan,
}

/// Persistence boundary consumed by `UpdateService`. Carried as `Arc<dyn ResumeStore>`.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Owner-scoped lookup. `None` when the id does not exist or belongs to someone else.
    async fn fetch(&self, resume_id: Uuid, user_id: Uuid) -> Result<Option<ResumeRow>, StoreError>;

    /// Stores `write.resume` as the new current version; returns the new version number.
    async fn store(&self, write: VersionedWrite<'_>) -> Result<i32, StoreError>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn fetch(&self, resume_id: Uuid, user_id: Uuid) -> Result<Option<ResumeRow>, StoreError> {
        Ok(fetch_resume(&self.pool, resume_id, user_id).await?)
    }

    async fn store(&self, write: VersionedWrite<'_>) -> Result<i32, StoreError> {
        commit_merged_version(&self.pool, write).await
    }
}

/// Fields accepted when registering a resume.
pub struct NewResume<'a> {
    pub user_id: Uuid,
    pub filename: &'a str,
    pub extracted_text: Option<&'a str>,
    pub parsed_data: Option<&'a StructuredResume>,
}

/// Inserts a resume at version 1. When structured data is supplied it also becomes
/// the first history entry.
pub async fn insert_resume(pool: &PgPool, new: NewResume<'_>) -> Result<ResumeRow, StoreError> {
    let parsed_data = new.parsed_data.map(serde_json::to_value).transpose()?;
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, user_id, filename, extracted_text, parsed_data, version)
        VALUES ($1, $2, $3, $4, $5, 1)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(new.filename)
    .bind(new.extracted_text)
    .bind(&parsed_data)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(data) = &parsed_data {
        append_version(&mut tx, row.id, row.version, data, None).await?;
    }

    tx.commit().await?;
    info!("Registered resume {} for user {}", row.id, row.user_id);
    Ok(row)
}

pub async fn fetch_resume(
    pool: &PgPool,
    resume_id: Uuid,
    user_id: Uuid,
) -> Result<Option<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(resume_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_resumes_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ResumeSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeSummaryRow>(
        r#"
        SELECT id, filename, version, created_at, updated_at
        FROM resumes
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Stored versions of a resume, oldest first.
pub async fn get_version_history(
    pool: &PgPool,
    resume_id: Uuid,
) -> Result<Vec<ResumeVersionRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeVersionRow>(
        "SELECT * FROM resume_versions WHERE resume_id = $1 ORDER BY version ASC",
    )
    .bind(resume_id)
    .fetch_all(pool)
    .await
}

/// Records the latest AI analysis. Returns false when no owned resume matched.
pub async fn save_analysis(
    pool: &PgPool,
    resume_id: Uuid,
    user_id: Uuid,
    analysis: &Value,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE resumes SET ai_analysis = $1, updated_at = NOW() WHERE id = $2 AND user_id = $3",
    )
    .bind(analysis)
    .bind(resume_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Replaces the current structured data and appends the history row, atomically.
pub async fn commit_merged_version(pool: &PgPool, write: VersionedWrite<'_>) -> Result<i32, StoreError> {
    let VersionedWrite {
        resume_id,
        expected_version,
        resume,
        plan,
    } = write;
    let data = serde_json::to_value(resume)?;
    let plan = serde_json::to_value(plan)?;

    let mut tx = pool.begin().await?;

    let new_version: Option<i32> = sqlx::query_scalar(
        r#"
        UPDATE resumes
        SET parsed_data = $1, version = version + 1, updated_at = NOW()
        WHERE id = $2 AND version = $3
        RETURNING version
        "#,
    )
    .bind(&data)
    .bind(resume_id)
    .bind(expected_version)
    .fetch_optional(&mut *tx)
    .await?;

    // Dropping `tx` rolls back.
    let new_version = new_version.ok_or(StoreError::StaleVersion {
        resume_id,
        expected_version,
    })?;

    append_version(&mut tx, resume_id, new_version, &data, Some(&plan)).await?;
    tx.commit().await?;

    info!("Stored resume {resume_id} version {new_version}");
    Ok(new_version)
}

async fn append_version(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    resume_id: Uuid,
    version: i32,
    data: &Value,
    plan: Option<&Value>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO resume_versions (id, resume_id, version, parsed_data, change_plan)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resume_id)
    .bind(version)
    .bind(data)
    .bind(plan)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
