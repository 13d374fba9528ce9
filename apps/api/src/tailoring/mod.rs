// Resume tailoring core.
// Validation, upload lifetime, job description acquisition, prompt composition,
// and the AI call are sequenced by `pipeline::TailoringPipeline`.

pub mod handlers;
pub mod job_description;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod resume_text;
pub mod validation;

#[cfg(test)]
pub mod test_support;
