//! Prompt composition for resume tailoring. Pure and deterministic: the same
//! inputs always produce byte-identical prompts.

use crate::tailoring::models::{DescriptionOrigin, JobMetadata, ResolvedJobDescription};

const ROLE_FALLBACK: &str = "Not explicitly provided";
const COMPANY_FALLBACK: &str = "Not specified";

const PREAMBLE: &str = "You are an expert resume writer and ATS (Applicant Tracking System) \
optimization specialist.
Your task is to tailor the following resume based on the provided job details to maximize \
the candidate's chances of getting an interview.";

const INSTRUCTIONS: &str = "**Instructions:**
1.  **Analyze:** Identify the key skills, qualifications, technologies, and responsibilities \
the job emphasizes.
2.  **Tailor:** Rewrite the summary, experience bullet points, and skills section so the most \
relevant experience comes first.
3.  **ATS Optimization:** Use important keywords from the job description naturally, with \
standard section headings and plain formatting.
4.  **Quantify:** Keep measurable achievements from the original resume. Never invent \
employers, titles, dates, numbers, or credentials.
5.  **Tone:** Use concise, professional language with strong action verbs.
6.  **Output:** Provide only the full text of the *tailored* resume. Do not include \
explanations or conversational text.";

/// The exact text sent to the AI service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailoringPrompt {
    pub text: String,
}

/// Builds the tailoring prompt. Total over validated inputs.
pub fn compose(
    resume_text: &str,
    job_description: &ResolvedJobDescription,
    metadata: &JobMetadata,
) -> TailoringPrompt {
    let role = metadata.role.as_deref().unwrap_or(ROLE_FALLBACK);
    let company = metadata.company.as_deref().unwrap_or(COMPANY_FALLBACK);
    let context_marker = match job_description.origin {
        DescriptionOrigin::Url => " (Extracted from URL)",
        DescriptionOrigin::Manual => "",
    };

    let text = format!(
        "{PREAMBLE}

**Original Resume Text:**
```
{resume}
```

**Job Details:**
*   **Input Method:** {method}
*   **Job Role:** {role}
*   **Company:** {company}
*   **Job Description/Context:**{context_marker}
```
{description}
```

{INSTRUCTIONS}

**Tailored Resume Output:**
",
        resume = resume_text.trim(),
        method = job_description.origin.label(),
        description = job_description.text.trim(),
    );

    TailoringPrompt { text }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_MANUAL: &str = "You are an expert resume writer and ATS (Applicant Tracking System) optimization specialist.
Your task is to tailor the following resume based on the provided job details to maximize the candidate's chances of getting an interview.

**Original Resume Text:**
```
Jane Doe
SQL, Excel
```

**Job Details:**
*   **Input Method:** Manual
*   **Job Role:** Data Analyst
*   **Company:** Not specified
*   **Job Description/Context:**
```
Analyze datasets
```

**Instructions:**
1.  **Analyze:** Identify the key skills, qualifications, technologies, and responsibilities the job emphasizes.
2.  **Tailor:** Rewrite the summary, experience bullet points, and skills section so the most relevant experience comes first.
3.  **ATS Optimization:** Use important keywords from the job description naturally, with standard section headings and plain formatting.
4.  **Quantify:** Keep measurable achievements from the original resume. Never invent employers, titles, dates, numbers, or credentials.
5.  **Tone:** Use concise, professional language with strong action verbs.
6.  **Output:** Provide only the full text of the *tailored* resume. Do not include explanations or conversational text.

**Tailored Resume Output:**
";

    fn manual_description(text: &str) -> ResolvedJobDescription {
        ResolvedJobDescription::new(text.to_string(), DescriptionOrigin::Manual)
    }

    #[test]
    fn test_manual_prompt_matches_template_exactly() {
        let metadata = JobMetadata {
            role: Some("Data Analyst".to_string()),
            company: None,
        };
        let prompt = compose(
            "Jane Doe\nSQL, Excel\n",
            &manual_description("Analyze datasets"),
            &metadata,
        );
        assert_eq!(prompt.text, EXPECTED_MANUAL);
    }

    #[test]
    fn test_url_prompt_marks_extracted_context() {
        let metadata = JobMetadata {
            role: None,
            company: Some("Acme".to_string()),
        };
        let description =
            ResolvedJobDescription::new("Build dashboards".to_string(), DescriptionOrigin::Url);
        let prompt = compose("Jane Doe", &description, &metadata);

        assert!(prompt.text.contains("*   **Input Method:** URL\n"));
        assert!(prompt.text.contains("*   **Job Role:** Not explicitly provided\n"));
        assert!(prompt.text.contains("*   **Company:** Acme\n"));
        assert!(prompt
            .text
            .contains("*   **Job Description/Context:** (Extracted from URL)\n```\nBuild dashboards\n```"));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let metadata = JobMetadata::default();
        let description = manual_description("Analyze datasets");
        let first = compose("Jane Doe", &description, &metadata);
        let second = compose("Jane Doe", &description, &metadata);
        assert_eq!(first, second);
    }

    #[test]
    fn test_placeholder_like_input_is_not_reinterpreted() {
        let metadata = JobMetadata::default();
        let prompt = compose(
            "{description} {role}",
            &manual_description("{resume}"),
            &metadata,
        );
        assert!(prompt.text.contains("```\n{description} {role}\n```"));
        assert!(prompt.text.contains("```\n{resume}\n```"));
    }
}
