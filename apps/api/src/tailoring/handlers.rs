//! Axum route handlers for the Tailoring API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::errors::{AppError, ErrorKind};
use crate::state::AppState;
use crate::tailoring::models::{ResumeUpload, TailoringResult, TailoringSubmission};
use crate::tailoring::validation::ValidationError;

pub const RESUME_FIELD: &str = "resumeFile";
pub const JOB_LINK_FIELD: &str = "jobLink";
pub const JOB_ROLE_FIELD: &str = "jobRole";
pub const COMPANY_FIELD: &str = "company";
pub const JOB_DESCRIPTION_FIELD: &str = "jobDescription";

/// POST /api/v1/tailor
///
/// Multipart form: `resumeFile` plus either `jobLink` or `jobRole` + `jobDescription`
/// (`company` optional). Responds with the serialized `TailoringResult`; the HTTP
/// status is derived from the failure kind.
pub async fn handle_tailor(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = match read_submission(multipart).await {
        Ok(submission) => submission,
        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            let error = ValidationError::FileTooLarge {
                limit_bytes: state.pipeline.validator().upload_size_limit_bytes(),
            };
            return Ok(result_response(TailoringResult::Failure {
                kind: error.kind(),
                message: error.to_string(),
            }));
        }
        Err(e) if e.status().is_client_error() => {
            return Err(AppError::Validation(e.body_text()))
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to read multipart form: {e}").into()),
    };

    let result = state.pipeline.submit(submission).await;
    Ok(result_response(result))
}

fn result_response(result: TailoringResult) -> Response {
    let status = result
        .failure_kind()
        .map(ErrorKind::http_status)
        .unwrap_or(StatusCode::OK);
    (status, Json(result)).into_response()
}

async fn read_submission(mut multipart: Multipart) -> Result<TailoringSubmission, MultipartError> {
    let mut submission = TailoringSubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            RESUME_FIELD => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                submission.resume = Some(ResumeUpload { filename, bytes });
            }
            JOB_LINK_FIELD => submission.job.job_link = field.text().await?,
            JOB_ROLE_FIELD => submission.job.job_role = field.text().await?,
            COMPANY_FIELD => submission.job.company = field.text().await?,
            JOB_DESCRIPTION_FIELD => submission.job.job_description = field.text().await?,
            _ => debug!("Ignoring unknown form field '{name}'"),
        }
    }

    Ok(submission)
}
