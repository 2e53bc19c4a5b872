use chrono::{DateTime, Duration, SubsecRound, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use sqlx::FromRow;

const ID_SUFFIX_LEN: usize = 6;

/// A tracked job-application resume.
///
/// `file_path` is populated when attachments live on disk, `file_content`
/// when they are stored inline with the record. The raw bytes never leave
/// the server as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Resume {
    pub id: String,
    pub role: String,
    pub company: String,
    pub version: String,
    pub status: String,
    pub notes: String,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    #[serde(skip)]
    pub file_content: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the caller when creating a resume.
#[derive(Debug, Clone, Default)]
pub struct NewResume {
    pub role: String,
    pub company: String,
    pub version: String,
    pub status: String,
    pub notes: String,
}

/// Where an uploaded document ended up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileAttachment {
    pub file_name: String,
    pub file_path: Option<String>,
    pub content: Option<Vec<u8>>,
}

impl Resume {
    pub fn new(fields: NewResume) -> Self {
        let now = now_micros();
        Resume {
            id: generate_id(now),
            role: fields.role,
            company: fields.company,
            version: fields.version,
            status: fields.status,
            notes: fields.notes,
            file_name: None,
            file_path: None,
            file_content: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_status(&mut self, status: &str, notes: &str) {
        self.status = status.to_string();
        self.notes = notes.to_string();
        self.touch();
    }

    pub fn set_file_info(&mut self, attachment: FileAttachment) {
        self.file_name = Some(attachment.file_name);
        self.file_path = attachment.file_path;
        self.file_content = attachment.content;
        self.touch();
    }

    /// Bumps `updated_at`, always moving it strictly forward even when the
    /// clock has not advanced since the previous mutation.
    fn touch(&mut self) {
        self.updated_at = now_micros().max(self.updated_at + Duration::microseconds(1));
    }
}

/// Current time at the microsecond precision Postgres `TIMESTAMPTZ` keeps, so
/// a record reads back exactly as it was written.
fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// `YYYYMMDDHHMMSS-xxxxxx`: creation time plus a random alphanumeric suffix.
pub fn generate_id(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}-{suffix}", now.format("%Y%m%d%H%M%S"))
}
