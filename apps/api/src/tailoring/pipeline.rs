//! Tailoring pipeline: the single entry point of the core.
//!
//! Flow: validate → store upload → resolve job description → extract resume text →
//!       compose prompt → invoke AI → release upload → result.
//!
//! Validation failures return before anything is stored. Once the upload is stored,
//! every outcome (success, extraction failure, AI failure, cancellation) goes through
//! the same `release()` call before the result is produced.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::ErrorKind;
use crate::llm_client::{AiError, TextGenerator};
use crate::tailoring::job_description::{ExtractionError, JobDescriptionAcquirer};
use crate::tailoring::models::{
    JobDescriptionSource, JobMetadata, TailoringRequest, TailoringResult, TailoringSubmission,
    ValidatedUpload,
};
use crate::tailoring::prompts::compose;
use crate::tailoring::resume_text::extract_resume_text;
use crate::tailoring::validation::{InputValidator, ValidationError};
use crate::uploads::{ResourceError, UploadGuard, UploadStore};

#[derive(Debug, Error)]
pub enum TailoringError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("The request was cancelled.")]
    Cancelled,
}

impl TailoringError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TailoringError::Validation(e) => e.kind(),
            TailoringError::Resource(ResourceError::StorageWriteFailure { .. }) => {
                ErrorKind::StorageWriteFailure
            }
            TailoringError::Resource(ResourceError::StorageDeleteFailure { .. }) => {
                ErrorKind::StorageDeleteFailure
            }
            TailoringError::Extraction(e) => e.kind(),
            TailoringError::Ai(e) => e.kind(),
            TailoringError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Last stage a request reached. Failures are reported against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Validated,
    ResourceAcquired,
    DescriptionResolved,
    Composed,
    Invoked,
}

/// Sequences the tailoring components. Cheap to clone; holds only shared, read-only parts.
#[derive(Clone)]
pub struct TailoringPipeline {
    validator: InputValidator,
    uploads: UploadStore,
    acquirer: JobDescriptionAcquirer,
    generator: Arc<dyn TextGenerator>,
}

impl TailoringPipeline {
    pub fn new(
        validator: InputValidator,
        uploads: UploadStore,
        acquirer: JobDescriptionAcquirer,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            validator,
            uploads,
            acquirer,
            generator,
        }
    }

    pub fn from_config(config: &Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self::new(
            InputValidator::from_config(config),
            UploadStore::new(config.storage_root.clone()),
            JobDescriptionAcquirer::new(config.fetch_timeout(), config.fetch_max_bytes),
            generator,
        )
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    pub fn validator(&self) -> &InputValidator {
        &self.validator
    }

    /// Runs one request to completion.
    pub async fn submit(&self, submission: TailoringSubmission) -> TailoringResult {
        self.submit_with_cancellation(submission, std::future::pending())
            .await
    }

    /// Like `submit`, but abandons the request as soon as `cancelled` resolves.
    /// The stored upload is released before the `Cancelled` failure is returned.
    pub async fn submit_with_cancellation<C>(
        &self,
        submission: TailoringSubmission,
        cancelled: C,
    ) -> TailoringResult
    where
        C: Future<Output = ()>,
    {
        let mut stage = PipelineStage::Received;
        info!("Received tailoring request");

        let (upload, source, metadata) = match self.validate(&submission) {
            Ok(validated) => validated,
            Err(e) => return failure(stage, e.into()),
        };
        advance(&mut stage, PipelineStage::Validated);

        let mut guard = match self
            .uploads
            .acquire(&upload.bytes, &upload.filename, &upload.extension)
            .await
        {
            Ok(guard) => guard,
            Err(e) => return failure(stage, e.into()),
        };
        let stored = guard.resume();
        info!(
            "Stored resume '{}' ({} bytes, .{}) at {}",
            stored.original_filename,
            stored.size_bytes,
            stored.extension,
            guard.path().display()
        );
        advance(&mut stage, PipelineStage::ResourceAcquired);

        let outcome = tokio::select! {
            outcome = self.run_with_upload(&guard, &source, metadata, &mut stage) => outcome,
            () = cancelled => {
                info!("Tailoring request abandoned by caller");
                Err(TailoringError::Cancelled)
            }
        };

        if let Err(e) = guard.release().await {
            // Cleanup failures are a maintenance concern; the request outcome stands.
            warn!(
                kind = ?ErrorKind::StorageDeleteFailure,
                path = %e.path().display(),
                "Error removing uploaded file: {e:?}"
            );
        }

        match outcome {
            Ok(text) => {
                info!("Tailoring completed ({} chars)", text.chars().count());
                TailoringResult::Success { text }
            }
            Err(e) => failure(stage, e),
        }
    }

    fn validate(
        &self,
        submission: &TailoringSubmission,
    ) -> Result<(ValidatedUpload, JobDescriptionSource, JobMetadata), ValidationError> {
        let upload = self.validator.validate_upload(submission.resume.as_ref())?;
        let details = self.validator.validate_job_details(&submission.job)?;
        Ok((upload, details.source, details.metadata))
    }

    async fn run_with_upload(
        &self,
        guard: &UploadGuard,
        source: &JobDescriptionSource,
        metadata: JobMetadata,
        stage: &mut PipelineStage,
    ) -> Result<String, TailoringError> {
        debug!("Resolving job description ({})", source.origin().label());
        let job_description = self.acquirer.resolve(source).await?;
        advance(stage, PipelineStage::DescriptionResolved);

        let resume_text = extract_resume_text(guard.path()).await?;
        let request = TailoringRequest {
            resume_text,
            job_description,
            metadata,
        };

        let prompt = compose(
            &request.resume_text,
            &request.job_description,
            &request.metadata,
        );
        advance(stage, PipelineStage::Composed);

        let text = self.generator.invoke(&prompt.text).await?;
        advance(stage, PipelineStage::Invoked);

        if text.trim().is_empty() {
            return Err(AiError::MalformedResponse(
                "AI processing finished but no content generated.".to_string(),
            )
            .into());
        }
        Ok(text)
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    debug!("Pipeline stage {:?} -> {:?}", stage, next);
    *stage = next;
}

fn failure(stage: PipelineStage, error: TailoringError) -> TailoringResult {
    let kind = error.kind();
    warn!(
        ?stage,
        ?kind,
        retryable = kind.is_retryable(),
        "Tailoring failed: {error}"
    );
    TailoringResult::Failure {
        kind,
        message: error.to_string(),
    }
}
