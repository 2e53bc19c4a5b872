use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::resume::{FileAttachment, Resume};
use crate::store::{not_found, ResumeStore};

// Keeps updated_at strictly increasing even if two writes land in the same
// clock tick.
const NEXT_UPDATED_AT: &str = "GREATEST($2, updated_at + INTERVAL '1 microsecond')";

/// Postgres-backed store. Every operation is exactly one statement; row-level
/// consistency is left to the database.
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
    async fn create(&self, resume: &Resume) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO resumes
                (id, role, company, version, status, notes,
                 file_name, file_path, file_content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&resume.id)
        .bind(&resume.role)
        .bind(&resume.company)
        .bind(&resume.version)
        .bind(&resume.status)
        .bind(&resume.notes)
        .bind(&resume.file_name)
        .bind(&resume.file_path)
        .bind(&resume.file_content)
        .bind(resume.created_at)
        .bind(resume.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::AlreadyExists(format!(
                "Resume {} already exists",
                resume.id
            )));
        }
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Resume, AppError> {
        sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn get_all(&self) -> Result<Vec<Resume>, AppError> {
        let rows = sqlx::query_as::<_, Resume>("SELECT * FROM resumes ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_by_role(&self, role: &str) -> Result<Vec<Resume>, AppError> {
        if role.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Resume>(
            "SELECT * FROM resumes WHERE role = $1 ORDER BY created_at DESC",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_company(&self, company: &str) -> Result<Vec<Resume>, AppError> {
        if company.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Resume>(
            "SELECT * FROM resumes WHERE company = $1 ORDER BY created_at DESC",
        )
        .bind(company)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_status(
        &self,
        id: &str,
        status: &str,
        notes: &str,
    ) -> Result<Resume, AppError> {
        let sql = format!(
            "UPDATE resumes SET updated_at = {NEXT_UPDATED_AT}, status = $3, notes = $4 \
             WHERE id = $1 RETURNING *"
        );
        sqlx::query_as::<_, Resume>(&sql)
            .bind(id)
            .bind(Utc::now())
            .bind(status)
            .bind(notes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn update_file_info(
        &self,
        id: &str,
        attachment: FileAttachment,
    ) -> Result<Resume, AppError> {
        let sql = format!(
            "UPDATE resumes SET updated_at = {NEXT_UPDATED_AT}, \
             file_name = $3, file_path = $4, file_content = $5 \
             WHERE id = $1 RETURNING *"
        );
        sqlx::query_as::<_, Resume>(&sql)
            .bind(id)
            .bind(Utc::now())
            .bind(attachment.file_name)
            .bind(attachment.file_path)
            .bind(attachment.content)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
