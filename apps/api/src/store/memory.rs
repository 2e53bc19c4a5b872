use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::resume::{FileAttachment, Resume};
use crate::store::{not_found, ResumeStore};

/// Process-local store: one map keyed by id behind a single `RwLock`.
/// Reads share the lock, mutations take it exclusively.
#[derive(Default)]
pub struct InMemoryResumeStore {
    resumes: RwLock<HashMap<String, Resume>>,
}

impl InMemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select<F>(&self, predicate: F) -> Vec<Resume>
    where
        F: Fn(&Resume) -> bool + Send,
    {
        let resumes = self.resumes.read().await;
        let mut matched: Vec<Resume> = resumes
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }
}

#[async_trait]
impl ResumeStore for InMemoryResumeStore {
    async fn create(&self, resume: &Resume) -> Result<(), AppError> {
        let mut resumes = self.resumes.write().await;
        if resumes.contains_key(&resume.id) {
            return Err(AppError::AlreadyExists(format!(
                "Resume {} already exists",
                resume.id
            )));
        }
        resumes.insert(resume.id.clone(), resume.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Resume, AppError> {
        self.resumes
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn get_all(&self) -> Result<Vec<Resume>, AppError> {
        Ok(self.select(|_| true).await)
    }

    async fn get_by_role(&self, role: &str) -> Result<Vec<Resume>, AppError> {
        if role.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.select(|r| r.role == role).await)
    }

    async fn get_by_company(&self, company: &str) -> Result<Vec<Resume>, AppError> {
        if company.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.select(|r| r.company == company).await)
    }

    async fn update_status(
        &self,
        id: &str,
        status: &str,
        notes: &str,
    ) -> Result<Resume, AppError> {
        let mut resumes = self.resumes.write().await;
        let resume = resumes.get_mut(id).ok_or_else(|| not_found(id))?;
        resume.update_status(status, notes);
        Ok(resume.clone())
    }

    async fn update_file_info(
        &self,
        id: &str,
        attachment: FileAttachment,
    ) -> Result<Resume, AppError> {
        let mut resumes = self.resumes.write().await;
        let resume = resumes.get_mut(id).ok_or_else(|| not_found(id))?;
        resume.set_file_info(attachment);
        Ok(resume.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.resumes
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }
}
