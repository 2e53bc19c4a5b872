//! Resume persistence.
//!
//! `ResumeStore` is the single seam between the service layer and storage.
//! `AppState` carries an `Arc<dyn ResumeStore>` picked once at startup from
//! `STORAGE_BACKEND`: `InMemoryResumeStore` or `PgResumeStore`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::resume::{FileAttachment, Resume};

pub use memory::InMemoryResumeStore;
pub use postgres::PgResumeStore;

/// Storage contract shared by every backend.
///
/// Listing operations return newest first. An empty filter value matches
/// nothing and yields an empty list rather than an error.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Fails with `AlreadyExists` if the id is already stored.
    async fn create(&self, resume: &Resume) -> Result<(), AppError>;

    async fn get_by_id(&self, id: &str) -> Result<Resume, AppError>;

    async fn get_all(&self) -> Result<Vec<Resume>, AppError>;

    async fn get_by_role(&self, role: &str) -> Result<Vec<Resume>, AppError>;

    async fn get_by_company(&self, company: &str) -> Result<Vec<Resume>, AppError>;

    async fn update_status(&self, id: &str, status: &str, notes: &str)
        -> Result<Resume, AppError>;

    async fn update_file_info(
        &self,
        id: &str,
        attachment: FileAttachment,
    ) -> Result<Resume, AppError>;

    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

pub(crate) fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Resume {id} not found"))
}
