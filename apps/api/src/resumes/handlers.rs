//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::models::resume::{NewResume, Resume};
use crate::resumes::content::extract_pdf_text;
use crate::resumes::service::ResumeService;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Only the literal `true` turns extraction on; any other value is false.
#[derive(Debug, Default, Deserialize)]
pub struct ContentQuery {
    pub include_content: Option<String>,
}

impl ContentQuery {
    fn wants_content(&self) -> bool {
        include_content(self.include_content.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub role: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub include_content: Option<String>,
}

impl ListQuery {
    fn wants_content(&self) -> bool {
        include_content(self.include_content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: String,
}

/// A stored resume plus, on request, the text extracted from its document.
#[derive(Debug, Serialize)]
pub struct ResumeView {
    #[serde(flatten)]
    pub resume: Resume,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

struct UploadedFile {
    file_name: String,
    data: Bytes,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /resumes
///
/// Multipart form with `role`, `company`, `version`, `status`, `notes` and an
/// optional `file`. Nothing is stored unless every field, including the file
/// name, is valid.
pub async fn handle_create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Resume>), AppError> {
    let mut fields = NewResume::default();
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "role" => fields.role = field.text().await?,
            "company" => fields.company = field.text().await?,
            "version" => fields.version = field.text().await?,
            "status" => fields.status = field.text().await?,
            "notes" => fields.notes = field.text().await?,
            "file" => file = read_file_field(field).await?,
            _ => {}
        }
    }

    let file = file
        .as_ref()
        .map(|upload| (&upload.data[..], upload.file_name.as_str()));
    let resume = state.service.create_resume_with_file(fields, file).await?;

    Ok((StatusCode::CREATED, Json(resume)))
}

/// GET /resumes/:id?include_content=true
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppQuery(params): AppQuery<ContentQuery>,
) -> Result<Json<ResumeView>, AppError> {
    let resume = state.service.get_resume(&id).await?;

    let content = if params.wants_content() {
        extract_content(&state.service, &resume).await?
    } else {
        None
    };

    Ok(Json(ResumeView { resume, content }))
}

/// GET /resumes?role=&company=&status=&include_content=true
///
/// `role` is resolved by the store, then `company`; whichever filters remain
/// are applied here. Extraction failures drop `content` for that entry only.
pub async fn handle_list(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListQuery>,
) -> Result<Json<Vec<ResumeView>>, AppError> {
    let role = non_empty(params.role.as_deref());
    let company = non_empty(params.company.as_deref());
    let status = non_empty(params.status.as_deref());

    let mut resumes = match (role, company) {
        (Some(role), _) => state.service.get_resumes_by_role(role).await?,
        (None, Some(company)) => state.service.get_resumes_by_company(company).await?,
        (None, None) => state.service.get_all_resumes().await?,
    };

    if role.is_some() {
        if let Some(company) = company {
            resumes.retain(|r| r.company == company);
        }
    }
    if let Some(status) = status {
        resumes.retain(|r| r.status == status);
    }

    let mut views = Vec::with_capacity(resumes.len());
    for resume in resumes {
        let content = if params.wants_content() {
            extract_content(&state.service, &resume)
                .await
                .unwrap_or_else(|e| {
                    warn!(id = %resume.id, "Skipping content extraction: {e}");
                    None
                })
        } else {
            None
        };
        views.push(ResumeView { resume, content });
    }

    Ok(Json(views))
}

/// PUT|PATCH /resumes/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .service
        .update_resume_status(&id, &req.status, &req.notes)
        .await?;
    Ok(Json(json!({ "message": "Status updated successfully" })))
}

/// POST /resumes/:id/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            file = read_file_field(field).await?;
        }
    }

    let upload = file.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    state
        .service
        .upload_resume_file(&id, &upload.data, &upload.file_name)
        .await?;

    Ok(Json(json!({ "message": "File uploaded successfully" })))
}

/// GET /resumes/:id/download
///
/// Returns the attached document as an attachment under its original name.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let resume = state.service.get_resume(&id).await?;
    let data = state
        .service
        .read_file(&resume)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No file attached to resume {id}")))?;

    // Header values must be visible ASCII.
    let file_name: String = resume
        .file_name
        .unwrap_or_else(|| format!("{id}.bin"))
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let content_type = if file_name.to_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        data,
    ))
}

/// DELETE /resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.service.delete_resume(&id).await?;
    Ok(Json(json!({ "message": "Resume deleted successfully" })))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn read_file_field(
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<UploadedFile>, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let data = field.bytes().await?;
    // Browsers send an empty part when the file input is left blank.
    if file_name.is_empty() && data.is_empty() {
        return Ok(None);
    }
    let file_name = if file_name.is_empty() {
        "resume.pdf".to_string()
    } else {
        file_name
    };
    Ok(Some(UploadedFile { file_name, data }))
}

async fn extract_content(
    service: &ResumeService,
    resume: &Resume,
) -> Result<Option<String>, AppError> {
    match service.read_file(resume).await? {
        Some(bytes) => Ok(Some(extract_pdf_text(bytes).await?)),
        None => Ok(None),
    }
}

fn include_content(value: Option<&str>) -> bool {
    value == Some("true")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
