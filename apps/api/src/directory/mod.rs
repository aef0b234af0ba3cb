//! Read-only access to tenant entities (candidates, job openings, people).
//!
//! The evaluation core only ever reads a handful of fields from the tenant
//! data store; everything else about those tables belongs to the CRUD layer.
//! Tenancy is an explicit `company_id` argument on every scoped query —
//! never ambient per-request state. Service-to-service callers (the webhook,
//! the evaluation worker) carry no tenant context, so candidate resolution is
//! by primary key and the row's own `company_id` scopes any further lookup.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::errors::AppError;
use crate::models::person::PersonRef;

#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: i64,
    pub company_id: i64,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub resume_data: Option<Json<Value>>,
}

impl CandidateRow {
    /// The resume lives behind `resume_data["url"]` when one was uploaded.
    pub fn resume_url(&self) -> Option<String> {
        self.resume_data
            .as_ref()
            .and_then(|data| data.0.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct JobOpeningRow {
    pub id: i64,
    pub company_id: i64,
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_candidate(&self, id: i64) -> Result<Option<CandidateRow>, AppError>;

    async fn find_job_opening(
        &self,
        company_id: i64,
        id: i64,
    ) -> Result<Option<JobOpeningRow>, AppError>;

    /// Tenant-scoped existence check, dispatched on the person's table.
    async fn person_exists(&self, company_id: i64, person: PersonRef) -> Result<bool, AppError>;
}

pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn find_candidate(&self, id: i64) -> Result<Option<CandidateRow>, AppError> {
        let candidate = sqlx::query_as::<_, CandidateRow>(
            "SELECT id, company_id, linkedin_url, github_url, resume_data \
             FROM candidates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(candidate)
    }

    async fn find_job_opening(
        &self,
        company_id: i64,
        id: i64,
    ) -> Result<Option<JobOpeningRow>, AppError> {
        let job_opening = sqlx::query_as::<_, JobOpeningRow>(
            "SELECT id, company_id FROM job_openings \
             WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job_opening)
    }

    async fn person_exists(&self, company_id: i64, person: PersonRef) -> Result<bool, AppError> {
        // Table name comes from the PersonRef dispatch table, never from input.
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1 AND company_id = $2)",
            person.table_name()
        ))
        .bind(person.id())
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubDirectory;
    use super::*;

    #[test]
    fn resume_url_reads_from_resume_data() {
        let candidate = StubDirectory::with_candidate(42, 1).candidates[0].clone();
        assert_eq!(
            candidate.resume_url().as_deref(),
            Some("https://files.example/resume-42.pdf")
        );
    }

    #[test]
    fn resume_url_absent_without_resume_data() {
        let candidate = CandidateRow {
            id: 1,
            company_id: 1,
            linkedin_url: None,
            github_url: None,
            resume_data: None,
        };
        assert_eq!(candidate.resume_url(), None);
    }
}
