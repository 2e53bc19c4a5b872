use crate::config::Config;
use crate::resumes::service::ResumeService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub service: ResumeService,
    pub config: Config,
}
