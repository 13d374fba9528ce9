//! Data carried through the tailoring pipeline, from raw form input to the terminal result.

use bytes::Bytes;
use serde::Serialize;

use crate::errors::ErrorKind;

// ────────────────────────────────────────────────────────────────────────────
// Boundary input
// ────────────────────────────────────────────────────────────────────────────

/// A file part exactly as the client sent it. Nothing here has been checked yet.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub bytes: Bytes,
}

/// Job-detail form fields. Absent fields are empty strings.
#[derive(Debug, Clone, Default)]
pub struct JobDetailsForm {
    pub job_link: String,
    pub job_role: String,
    pub company: String,
    pub job_description: String,
}

/// Everything a single tailoring request submits.
#[derive(Debug, Clone, Default)]
pub struct TailoringSubmission {
    pub resume: Option<ResumeUpload>,
    pub job: JobDetailsForm,
}

// ────────────────────────────────────────────────────────────────────────────
// Validated values
// ────────────────────────────────────────────────────────────────────────────

/// An upload that passed structural checks. Contents are not parsed yet.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub filename: String,
    pub extension: String,
    pub bytes: Bytes,
}

/// Where the job description comes from. A non-empty link always wins over manual fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobDescriptionSource {
    Manual {
        role: String,
        company: String,
        description: String,
    },
    Remote {
        url: String,
    },
}

impl JobDescriptionSource {
    pub fn origin(&self) -> DescriptionOrigin {
        match self {
            JobDescriptionSource::Manual { .. } => DescriptionOrigin::Manual,
            JobDescriptionSource::Remote { .. } => DescriptionOrigin::Url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DescriptionOrigin {
    Manual,
    Url,
}

impl DescriptionOrigin {
    /// Label used in the prompt's "Input Method" line.
    pub fn label(self) -> &'static str {
        match self {
            DescriptionOrigin::Manual => "Manual",
            DescriptionOrigin::Url => "URL",
        }
    }
}

/// Optional role/company context. Forwarded on both the manual and the URL path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobMetadata {
    pub role: Option<String>,
    pub company: Option<String>,
}

impl JobMetadata {
    /// Blank values become `None`.
    pub fn new(role: &str, company: &str) -> Self {
        Self {
            role: non_empty(role),
            company: non_empty(company),
        }
    }
}

/// Output of job-detail validation: the description source plus the prompt metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedJobDetails {
    pub source: JobDescriptionSource,
    pub metadata: JobMetadata,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Job description text ready for prompt composition. Never empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedJobDescription {
    pub text: String,
    pub origin: DescriptionOrigin,
    pub char_len: usize,
}

impl ResolvedJobDescription {
    pub fn new(text: String, origin: DescriptionOrigin) -> Self {
        let char_len = text.chars().count();
        Self {
            text,
            origin,
            char_len,
        }
    }
}

/// Aggregate handed to the prompt composer. Both text fields are non-empty.
#[derive(Debug, Clone)]
pub struct TailoringRequest {
    pub resume_text: String,
    pub job_description: ResolvedJobDescription,
    pub metadata: JobMetadata,
}

// ────────────────────────────────────────────────────────────────────────────
// Terminal value
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TailoringResult {
    Success { text: String },
    Failure { kind: ErrorKind, message: String },
}

impl TailoringResult {
    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            TailoringResult::Success { .. } => None,
            TailoringResult::Failure { kind, .. } => Some(*kind),
        }
    }
}
