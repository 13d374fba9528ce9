//! Job description acquisition: manual text passes through, links are fetched and
//! reduced to the visible text of the page body.
//!
//! Pages rendered entirely by client-side script come back with no usable body text
//! and fail with `EmptyContent`; callers can offer manual entry in that case.

use std::time::Duration;

use reqwest::{Client, Response};
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::errors::ErrorKind;
use crate::tailoring::models::{DescriptionOrigin, JobDescriptionSource, ResolvedJobDescription};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Elements whose text never counts as job description content.
const EXCLUDED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "header", "footer", "nav", "aside", "form",
    "button", "input",
];

/// Below this many characters an extraction succeeds but is logged as suspicious.
const LOW_TEXT_WARNING_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Could not fetch the job link ({reason}). Enter the job details manually.")]
    NetworkFailure { url: String, reason: String },

    #[error("Could not extract details from link. Enter the job details manually.")]
    EmptyContent { url: String },

    #[error("Could not read resume file.")]
    UnreadableResume { reason: String },

    #[error("Could not read resume file or it is empty.")]
    EmptyResume,
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::NetworkFailure { .. } => ErrorKind::NetworkFailure,
            ExtractionError::EmptyContent { .. } => ErrorKind::EmptyContent,
            ExtractionError::UnreadableResume { .. } => ErrorKind::UnreadableResume,
            ExtractionError::EmptyResume => ErrorKind::EmptyResume,
        }
    }
}

/// Resolves a `JobDescriptionSource` into description text.
#[derive(Clone)]
pub struct JobDescriptionAcquirer {
    client: Client,
    max_page_bytes: usize,
}

impl JobDescriptionAcquirer {
    /// `max_page_bytes` caps the fetched page body; larger pages fail with `NetworkFailure`.
    pub fn new(fetch_timeout: Duration, max_page_bytes: usize) -> Self {
        Self {
            client: Client::builder()
                .timeout(fetch_timeout)
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to build HTTP client"),
            max_page_bytes,
        }
    }

    pub async fn resolve(
        &self,
        source: &JobDescriptionSource,
    ) -> Result<ResolvedJobDescription, ExtractionError> {
        match source {
            JobDescriptionSource::Manual { description, .. } => Ok(ResolvedJobDescription::new(
                description.clone(),
                DescriptionOrigin::Manual,
            )),
            JobDescriptionSource::Remote { url } => self.fetch_description(url).await,
        }
    }

    async fn fetch_description(&self, url: &str) -> Result<ResolvedJobDescription, ExtractionError> {
        info!("Attempting to fetch content from URL: {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_failure(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            error!("Error fetching URL {url}: HTTP {status}");
            return Err(ExtractionError::NetworkFailure {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }
        info!("URL fetch successful (Status: {status})");

        let body = self.read_capped_body(url, response).await?;

        let text = extract_visible_text(&body);
        if text.trim().is_empty() {
            warn!("No visible body text found in content from {url}");
            return Err(ExtractionError::EmptyContent {
                url: url.to_string(),
            });
        }

        let resolved = ResolvedJobDescription::new(text, DescriptionOrigin::Url);
        info!("Extracted ~{} characters from {url}", resolved.char_len);
        if resolved.char_len < LOW_TEXT_WARNING_CHARS {
            warn!(
                "Extracted very little text ({} chars) from {url}.",
                resolved.char_len
            );
        }
        Ok(resolved)
    }
}

impl JobDescriptionAcquirer {
    async fn read_capped_body(
        &self,
        url: &str,
        mut response: Response,
    ) -> Result<String, ExtractionError> {
        if let Some(declared) = response.content_length() {
            if declared > self.max_page_bytes as u64 {
                return Err(self.page_too_large(url));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| network_failure(url, &e))?
        {
            if body.len() + chunk.len() > self.max_page_bytes {
                return Err(self.page_too_large(url));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn page_too_large(&self, url: &str) -> ExtractionError {
        error!("Page at {url} exceeds {} bytes", self.max_page_bytes);
        ExtractionError::NetworkFailure {
            url: url.to_string(),
            reason: format!("page exceeds {} bytes", self.max_page_bytes),
        }
    }
}

fn network_failure(url: &str, e: &reqwest::Error) -> ExtractionError {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else {
        e.to_string()
    };
    error!("Error fetching URL {url}: {e}");
    ExtractionError::NetworkFailure {
        url: url.to_string(),
        reason,
    }
}

/// Visible text of the document body, one text node per line, whitespace collapsed.
/// Returns an empty string when the body holds nothing but excluded elements.
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("static selector");

    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    body.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let excluded = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| EXCLUDED_ELEMENTS.contains(&el.name()))
            });
            if excluded {
                return None;
            }
            let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!collapsed.is_empty()).then_some(collapsed)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
