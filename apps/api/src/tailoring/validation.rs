//! Input validation: structural checks on the upload and the job-description fields.
//!
//! Runs before any file is stored or any network call is made, so a rejection
//! here never needs cleanup. File contents are not opened at this stage.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::config::Config;
use crate::errors::ErrorKind;
use crate::tailoring::models::{
    JobDescriptionSource, JobDetailsForm, JobMetadata, ResumeUpload, ValidatedJobDetails,
    ValidatedUpload,
};
use crate::uploads::filename::extension_of;

const ACCEPTED_SCHEMES: &[&str] = &["http://", "https://"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No resume file part selected.")]
    MissingFile,

    #[error("No resume file selected.")]
    EmptyFilename,

    #[error("Invalid resume file type ({} only).", format_extensions(.accepted))]
    BadExtension { accepted: Vec<String> },

    #[error("File too large (Max: {}MB).", .limit_bytes.div_ceil(1024 * 1024))]
    FileTooLarge { limit_bytes: u64 },

    #[error("{} required if no link.", format_missing_fields(.fields))]
    MissingManualFields { fields: Vec<ManualField> },

    #[error("Invalid Job Link URL format.")]
    BadUrlScheme,
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::MissingFile => ErrorKind::MissingFile,
            ValidationError::EmptyFilename => ErrorKind::EmptyFilename,
            ValidationError::BadExtension { .. } => ErrorKind::BadExtension,
            ValidationError::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            ValidationError::MissingManualFields { .. } => ErrorKind::MissingManualFields,
            ValidationError::BadUrlScheme => ErrorKind::BadUrlScheme,
        }
    }
}

/// Manual job-detail fields that are mandatory when no link is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualField {
    Role,
    Description,
}

impl ManualField {
    fn label(self) -> &'static str {
        match self {
            ManualField::Role => "Job Role",
            ManualField::Description => "Job Description",
        }
    }
}

fn format_extensions(accepted: &[String]) -> String {
    accepted
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_missing_fields(fields: &[ManualField]) -> String {
    match fields {
        [single] => format!("{} is", single.label()),
        _ => format!(
            "{} are",
            fields
                .iter()
                .map(|f| f.label())
                .collect::<Vec<_>>()
                .join(" and ")
        ),
    }
}

/// Checks uploads and job-detail fields against the configured policy.
#[derive(Debug, Clone)]
pub struct InputValidator {
    accepted_extensions: BTreeSet<String>,
    upload_size_limit_bytes: u64,
}

impl InputValidator {
    pub fn new(accepted_extensions: BTreeSet<String>, upload_size_limit_bytes: u64) -> Self {
        Self {
            accepted_extensions,
            upload_size_limit_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.accepted_extensions.clone(),
            config.upload_size_limit_bytes,
        )
    }

    pub fn upload_size_limit_bytes(&self) -> u64 {
        self.upload_size_limit_bytes
    }

    /// Fails on a missing part, an empty filename, an extension outside the accepted
    /// set, or a file over the size limit. Checked in that order.
    pub fn validate_upload(
        &self,
        upload: Option<&ResumeUpload>,
    ) -> Result<ValidatedUpload, ValidationError> {
        let upload = upload.ok_or(ValidationError::MissingFile)?;

        if upload.filename.trim().is_empty() {
            return Err(ValidationError::EmptyFilename);
        }
        let filename = upload.filename.as_str();

        let extension = extension_of(filename)
            .filter(|ext| self.accepted_extensions.contains(ext))
            .ok_or_else(|| ValidationError::BadExtension {
                accepted: self.accepted_extensions.iter().cloned().collect(),
            })?;

        if upload.bytes.len() as u64 > self.upload_size_limit_bytes {
            return Err(ValidationError::FileTooLarge {
                limit_bytes: self.upload_size_limit_bytes,
            });
        }

        Ok(ValidatedUpload {
            filename: filename.to_string(),
            extension,
            bytes: upload.bytes.clone(),
        })
    }

    /// Validates the job-detail fields and derives the prompt metadata from the result.
    /// On the manual path the metadata is the validated role and company; on the link
    /// path role and company are optional context taken as submitted.
    pub fn validate_job_details(
        &self,
        form: &JobDetailsForm,
    ) -> Result<ValidatedJobDetails, ValidationError> {
        let source = self.validate_description_source(form)?;
        let metadata = match &source {
            JobDescriptionSource::Manual { role, company, .. } => JobMetadata::new(role, company),
            JobDescriptionSource::Remote { .. } => JobMetadata::new(&form.job_role, &form.company),
        };
        Ok(ValidatedJobDetails { source, metadata })
    }

    /// A non-empty link always produces `Remote`, whatever the manual fields hold.
    /// Otherwise role and description must both be non-empty after trimming.
    pub fn validate_description_source(
        &self,
        form: &JobDetailsForm,
    ) -> Result<JobDescriptionSource, ValidationError> {
        let link = form.job_link.trim();
        if !link.is_empty() {
            if !ACCEPTED_SCHEMES.iter().any(|scheme| link.starts_with(scheme)) {
                return Err(ValidationError::BadUrlScheme);
            }
            return Ok(JobDescriptionSource::Remote {
                url: link.to_string(),
            });
        }

        let role = form.job_role.trim();
        let description = form.job_description.trim();

        let mut missing = Vec::new();
        if role.is_empty() {
            missing.push(ManualField::Role);
        }
        if description.is_empty() {
            missing.push(ManualField::Description);
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingManualFields { fields: missing });
        }

        Ok(JobDescriptionSource::Manual {
            role: role.to_string(),
            company: form.company.trim().to_string(),
            description: description.to_string(),
        })
    }
}
