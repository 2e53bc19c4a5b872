use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Config, FileStorageMode};
use crate::errors::AppError;
use crate::models::resume::{FileAttachment, NewResume, Resume};
use crate::store::ResumeStore;

/// Where uploaded documents are written.
#[derive(Debug, Clone)]
pub enum FileStorage {
    /// `<upload_dir>/<id>_<file name>` on local disk; the record keeps the path.
    Filesystem { upload_dir: PathBuf },
    /// Raw bytes kept on the record.
    Database,
}

impl FileStorage {
    pub fn from_config(config: &Config) -> Self {
        match config.file_storage {
            FileStorageMode::Filesystem => FileStorage::Filesystem {
                upload_dir: config.upload_dir.clone(),
            },
            FileStorageMode::Database => FileStorage::Database,
        }
    }
}

/// Business rules on top of a `ResumeStore`. Holds no per-request state.
#[derive(Clone)]
pub struct ResumeService {
    store: Arc<dyn ResumeStore>,
    files: FileStorage,
}

impl ResumeService {
    pub fn new(store: Arc<dyn ResumeStore>, files: FileStorage) -> Self {
        Self { store, files }
    }

    pub async fn create_resume(&self, fields: NewResume) -> Result<Resume, AppError> {
        self.create_resume_with_file(fields, None).await
    }

    /// Creates a resume and, when one is given, attaches its document.
    ///
    /// Every client-supplied value is checked before anything is stored, so a
    /// rejected request leaves no record behind. An I/O failure while writing
    /// the document still leaves the new record in place without a file.
    pub async fn create_resume_with_file(
        &self,
        fields: NewResume,
        file: Option<(&[u8], &str)>,
    ) -> Result<Resume, AppError> {
        if fields.role.trim().is_empty() || fields.company.trim().is_empty() {
            return Err(AppError::Validation(
                "role and company are required".to_string(),
            ));
        }
        let file = file
            .map(|(data, name)| sanitize_file_name(name).map(|name| (data, name)))
            .transpose()?;

        let resume = Resume::new(fields);
        self.store.create(&resume).await?;
        info!(id = %resume.id, role = %resume.role, company = %resume.company, "Resume created");

        let Some((data, file_name)) = file else {
            return Ok(resume);
        };
        self.attach(&resume, data, file_name).await
    }

    pub async fn get_resume(&self, id: &str) -> Result<Resume, AppError> {
        self.store.get_by_id(id).await
    }

    pub async fn get_all_resumes(&self) -> Result<Vec<Resume>, AppError> {
        self.store.get_all().await
    }

    pub async fn get_resumes_by_role(&self, role: &str) -> Result<Vec<Resume>, AppError> {
        self.store.get_by_role(role).await
    }

    pub async fn get_resumes_by_company(&self, company: &str) -> Result<Vec<Resume>, AppError> {
        self.store.get_by_company(company).await
    }

    pub async fn update_resume_status(
        &self,
        id: &str,
        status: &str,
        notes: &str,
    ) -> Result<Resume, AppError> {
        self.store.update_status(id, status, notes).await
    }

    /// Attaches a document to an existing resume, replacing any previous one.
    pub async fn upload_resume_file(
        &self,
        id: &str,
        data: &[u8],
        file_name: &str,
    ) -> Result<Resume, AppError> {
        let existing = self.store.get_by_id(id).await?;
        let file_name = sanitize_file_name(file_name)?;
        self.attach(&existing, data, file_name).await
    }

    async fn attach(
        &self,
        existing: &Resume,
        data: &[u8],
        file_name: String,
    ) -> Result<Resume, AppError> {
        let id = existing.id.as_str();
        let attachment = match &self.files {
            FileStorage::Filesystem { upload_dir } => {
                tokio::fs::create_dir_all(upload_dir).await?;
                let path = upload_dir.join(format!("{id}_{file_name}"));
                tokio::fs::write(&path, data).await?;
                FileAttachment {
                    file_name,
                    file_path: Some(path.to_string_lossy().into_owned()),
                    content: None,
                }
            }
            FileStorage::Database => FileAttachment {
                file_name,
                file_path: None,
                content: Some(data.to_vec()),
            },
        };

        let updated = self.store.update_file_info(id, attachment).await?;

        if let Some(stale) = existing.file_path.as_deref() {
            if updated.file_path.as_deref() != Some(stale) {
                if let Err(e) = remove_file_if_exists(Path::new(stale)).await {
                    warn!(id, path = stale, "Failed to remove replaced file: {e}");
                }
            }
        }

        info!(id, bytes = data.len(), "Resume file uploaded");
        Ok(updated)
    }

    /// Removes the attached file (if any) and then the record.
    ///
    /// The two steps are not atomic: if the record delete fails after the
    /// file is gone, the record survives without its file.
    pub async fn delete_resume(&self, id: &str) -> Result<(), AppError> {
        let resume = self.store.get_by_id(id).await?;

        if let Some(path) = resume.file_path.as_deref() {
            remove_file_if_exists(Path::new(path)).await?;
        }

        self.store.delete(id).await?;
        info!(id, "Resume deleted");
        Ok(())
    }

    /// Returns the attached document's bytes, wherever they are stored.
    pub async fn read_file(&self, resume: &Resume) -> Result<Option<Vec<u8>>, AppError> {
        if let Some(content) = &resume.file_content {
            return Ok(Some(content.clone()));
        }
        match resume.file_path.as_deref() {
            Some(path) => Ok(Some(tokio::fs::read(path).await?)),
            None => Ok(None),
        }
    }
}

/// Keeps only the final path component of a client-supplied name.
fn sanitize_file_name(raw: &str) -> Result<String, AppError> {
    Path::new(raw.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Invalid file name '{raw}'")))
}

async fn remove_file_if_exists(path: &Path) -> Result<(), AppError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryResumeStore;
    use tempfile::TempDir;

    fn filesystem_service(dir: &TempDir) -> ResumeService {
        ResumeService::new(
            Arc::new(InMemoryResumeStore::new()),
            FileStorage::Filesystem {
                upload_dir: dir.path().join("uploads"),
            },
        )
    }

    fn database_service() -> ResumeService {
        ResumeService::new(Arc::new(InMemoryResumeStore::new()), FileStorage::Database)
    }

    fn fields(role: &str, company: &str) -> NewResume {
        NewResume {
            role: role.to_string(),
            company: company.to_string(),
            version: "v2".to_string(),
            status: "applied".to_string(),
            notes: "referral".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_resume_generates_identity() {
        let service = database_service();
        let resume = service
            .create_resume(fields("Data Engineer", "Umbrella"))
            .await
            .unwrap();
        assert!(!resume.id.is_empty());
        assert_eq!(resume.created_at, resume.updated_at);
        assert_eq!(service.get_resume(&resume.id).await.unwrap(), resume);
    }

    #[tokio::test]
    async fn test_create_resume_requires_role_and_company() {
        let service = database_service();
        for (role, company) in [("", "Umbrella"), ("Data Engineer", ""), ("   ", "Umbrella")] {
            let err = service
                .create_resume(fields(role, company))
                .await
                .unwrap_err();
            assert!(
                matches!(err, AppError::Validation(_)),
                "({role:?}, {company:?}) should fail validation"
            );
        }
        assert!(service.get_all_resumes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_bad_file_name_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let service = filesystem_service(&dir);
        for name in ["..", "  ", "/"] {
            let err = service
                .create_resume_with_file(fields("SRE", "Hooli"), Some((&b"bytes"[..], name)))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{name:?}");
        }
        assert!(service.get_all_resumes().await.unwrap().is_empty());
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn test_create_with_file_attaches_document() {
        let service = database_service();
        let resume = service
            .create_resume_with_file(fields("SRE", "Hooli"), Some((&b"bytes"[..], "dir/cv.pdf")))
            .await
            .unwrap();
        assert_eq!(resume.file_name.as_deref(), Some("cv.pdf"));
        assert!(resume.updated_at > resume.created_at);
        assert_eq!(service.get_resume(&resume.id).await.unwrap(), resume);
    }

    #[tokio::test]
    async fn test_update_status_round_trip() {
        let service = database_service();
        let resume = service.create_resume(fields("SRE", "Hooli")).await.unwrap();

        service
            .update_resume_status(&resume.id, "interview", "onsite next week")
            .await
            .unwrap();
        let fetched = service.get_resume(&resume.id).await.unwrap();
        assert_eq!(fetched.status, "interview");
        assert_eq!(fetched.notes, "onsite next week");
        assert!(fetched.updated_at > resume.updated_at);
    }

    #[tokio::test]
    async fn test_filesystem_upload_writes_file() {
        let dir = TempDir::new().unwrap();
        let service = filesystem_service(&dir);
        let resume = service.create_resume(fields("SRE", "Hooli")).await.unwrap();

        let updated = service
            .upload_resume_file(&resume.id, b"resume bytes", "cv.pdf")
            .await
            .unwrap();

        let path = updated.file_path.clone().expect("file path recorded");
        assert!(path.ends_with(&format!("{}_cv.pdf", resume.id)));
        assert_eq!(updated.file_name.as_deref(), Some("cv.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"resume bytes");
        assert_eq!(
            service.read_file(&updated).await.unwrap().as_deref(),
            Some(&b"resume bytes"[..])
        );
    }

    #[tokio::test]
    async fn test_upload_strips_directory_components() {
        let dir = TempDir::new().unwrap();
        let service = filesystem_service(&dir);
        let resume = service.create_resume(fields("SRE", "Hooli")).await.unwrap();

        let updated = service
            .upload_resume_file(&resume.id, b"x", "../../etc/passwd")
            .await
            .unwrap();
        assert_eq!(updated.file_name.as_deref(), Some("passwd"));
        let path = PathBuf::from(updated.file_path.unwrap());
        assert!(path.starts_with(dir.path().join("uploads")));
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_file_name() {
        let service = database_service();
        let resume = service.create_resume(fields("SRE", "Hooli")).await.unwrap();
        let err = service
            .upload_resume_file(&resume.id, b"x", "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_upload_to_unknown_resume_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let service = filesystem_service(&dir);
        let err = service
            .upload_resume_file("nope", b"x", "cv.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn test_reupload_replaces_previous_file() {
        let dir = TempDir::new().unwrap();
        let service = filesystem_service(&dir);
        let resume = service.create_resume(fields("SRE", "Hooli")).await.unwrap();

        let first = service
            .upload_resume_file(&resume.id, b"old", "old.pdf")
            .await
            .unwrap();
        let second = service
            .upload_resume_file(&resume.id, b"new", "new.pdf")
            .await
            .unwrap();

        assert!(!Path::new(first.file_path.as_deref().unwrap()).exists());
        assert_eq!(
            std::fs::read(second.file_path.as_deref().unwrap()).unwrap(),
            b"new"
        );
    }

    #[tokio::test]
    async fn test_database_upload_keeps_bytes_on_record() {
        let service = database_service();
        let resume = service.create_resume(fields("SRE", "Hooli")).await.unwrap();

        let updated = service
            .upload_resume_file(&resume.id, b"inline bytes", "cv.pdf")
            .await
            .unwrap();
        assert!(updated.file_path.is_none());
        assert_eq!(updated.file_content.as_deref(), Some(&b"inline bytes"[..]));

        let fetched = service.get_resume(&resume.id).await.unwrap();
        for _ in 0..2 {
            assert_eq!(
                service.read_file(&fetched).await.unwrap().as_deref(),
                Some(&b"inline bytes"[..])
            );
        }
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_file() {
        let dir = TempDir::new().unwrap();
        let service = filesystem_service(&dir);
        let resume = service.create_resume(fields("SRE", "Hooli")).await.unwrap();
        let updated = service
            .upload_resume_file(&resume.id, b"bytes", "cv.pdf")
            .await
            .unwrap();
        let path = updated.file_path.unwrap();

        service.delete_resume(&resume.id).await.unwrap();

        assert!(!Path::new(&path).exists());
        assert!(matches!(
            service.get_resume(&resume.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let service = filesystem_service(&dir);
        let resume = service.create_resume(fields("SRE", "Hooli")).await.unwrap();
        let updated = service
            .upload_resume_file(&resume.id, b"bytes", "cv.pdf")
            .await
            .unwrap();
        std::fs::remove_file(updated.file_path.unwrap()).unwrap();

        service.delete_resume(&resume.id).await.unwrap();
        assert!(service.get_all_resumes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let service = database_service();
        assert!(matches!(
            service.delete_resume("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_read_file_without_attachment_is_none() {
        let service = database_service();
        let resume = service.create_resume(fields("SRE", "Hooli")).await.unwrap();
        assert!(service.read_file(&resume).await.unwrap().is_none());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("cv.pdf").unwrap(), "cv.pdf");
        assert_eq!(sanitize_file_name("dir/sub/cv.pdf").unwrap(), "cv.pdf");
        assert!(sanitize_file_name("..").is_err());
        assert!(sanitize_file_name("").is_err());
    }
}
