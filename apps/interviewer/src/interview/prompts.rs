// Interview LLM prompt templates and the response convention shared with the parser.
// Markers and labels below are matched byte-for-byte by `interview::parser`.

use crate::interview::models::{CandidateContext, QUESTION_COUNT, TARGET_TOTAL_POINTS};
use crate::llm_client::prompts::{NO_CODE_FENCES, STRICT_FORMAT_REMINDER};

pub const CAMPAIGN_CONTEXT_OPEN: &str = "<<<CAMPAIGN_CONTEXT>>>";
pub const CAMPAIGN_CONTEXT_CLOSE: &str = "<<<END_CAMPAIGN_CONTEXT>>>";
pub const JOB_DESCRIPTION_OPEN: &str = "<<<JOB_DESCRIPTION>>>";
pub const JOB_DESCRIPTION_CLOSE: &str = "<<<END_JOB_DESCRIPTION>>>";

/// Line that opens every question record.
pub const QUESTION_SEPARATOR: &str = "### QUESTION";

pub const LABEL_TITLE: &str = "TITLE";
pub const LABEL_QUESTION: &str = "QUESTION";
pub const LABEL_DIFFICULTY: &str = "DIFFICULTY";
pub const LABEL_POINTS: &str = "POINTS";
pub const LABEL_CRITERIA: &str = "CRITERIA";

pub const CONTEXT_ANALYSIS_SYSTEM: &str = "\
You are a Senior HR Analyst with deep expertise in technical recruiting. \
You read resumes and describe the role a candidate is suited for. \
You answer only in the exact marker format you are given.";

pub const QUESTION_GENERATION_SYSTEM: &str = "\
You are an Expert Technical Interviewer. \
You write interview questions that test the core technical competencies of a role. \
You answer only in the exact record format you are given.";

const JD_TEMPLATE: &str = "\
**Job Title:** [Role Name]

**Company Information:**
Join a dynamic team at **[Company Name]**, a leader in innovative technology...

**Key Responsibilities:**
- [Responsibility 1]
- [Responsibility 2]
- [Responsibility 3]

**Qualifications:**
- [Qualification 1]
- [Qualification 2]
- [Qualification 3]

**Nice to Have:**
- [Optional Skill 1]
- [Optional Skill 2]";

const CONTEXT_ANALYSIS_TEMPLATE: &str = r#"Analyze the resume below and synthesize the job this candidate should be interviewed for.

RESUME:
{resume_text}

JOB DESCRIPTION TEMPLATE:
{jd_template}

TASK:
1. Identify the candidate's skills, experience level and domain expertise.
2. Write ONE generalized job description that matches this profile, following the template.
3. Write a short campaign context summarizing the interview focus areas.
4. Do NOT describe the candidate. Describe the skills and scenarios that must be simulated
   to test a person for this role, phrased as "To simulate this job, the candidate must demonstrate...".

OUTPUT FORMAT (exactly these four marker lines, each on its own line):
{context_open}
<campaign context, 2-4 sentences>
{context_close}
{jd_open}
<full markdown job description>
{jd_close}

{no_fences}"#;

const QUESTION_GENERATION_TEMPLATE: &str = r#"Create interview questions for the role described below.

CAMPAIGN CONTEXT:
{campaign_context}

JOB DESCRIPTION:
{job_description}
{resume_section}
INSTRUCTIONS:
1. Identify the key technical skills the role requires.
2. Generalize them (e.g. "Project Apollo API" becomes "RESTful API Design").
3. Write exactly {count} questions, each on a distinct technical topic.
4. Mix "Easy", "Medium" and "Hard" questions. Do not use a single level for all of them.
5. SCORING RULES:
   - Hard questions: 10-15 points
   - Medium questions: 7-10 points
   - Easy questions: 3-7 points
   - The points of all {count} questions should add up to exactly {total}.

OUTPUT FORMAT: repeat the block below {count} times, one block per question.
Every field label must start its own line. Do not number the blocks.

{separator}
{title}: <short topic name>
{question}: <the question to ask>
{difficulty}: <Easy | Medium | Hard>
{points}: <integer>
{criteria}: <what a good answer must cover>

{no_fences}"#;

/// Builds the Phase 1 prompt. `resume_text` must already be plain text.
pub fn build_context_analysis_prompt(resume_text: &str, strict: bool) -> String {
    let prompt = CONTEXT_ANALYSIS_TEMPLATE
        .replace("{jd_template}", JD_TEMPLATE)
        .replace("{context_open}", CAMPAIGN_CONTEXT_OPEN)
        .replace("{context_close}", CAMPAIGN_CONTEXT_CLOSE)
        .replace("{jd_open}", JOB_DESCRIPTION_OPEN)
        .replace("{jd_close}", JOB_DESCRIPTION_CLOSE)
        .replace("{no_fences}", NO_CODE_FENCES)
        // resume last so its content is never re-scanned for placeholders
        .replace("{resume_text}", resume_text.trim());
    with_reminder(prompt, strict)
}

/// Builds the Phase 2 prompt. The resume text is optional extra grounding.
pub fn build_question_generation_prompt(
    context: &CandidateContext,
    resume_text: Option<&str>,
    strict: bool,
) -> String {
    let campaign_context = if context.campaign_context.trim().is_empty() {
        "(none provided)"
    } else {
        context.campaign_context.trim()
    };
    let resume_section = match resume_text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => format!("\nCANDIDATE RESUME (for reference only):\n{text}\n"),
        None => String::new(),
    };

    let prompt = QUESTION_GENERATION_TEMPLATE
        .replace("{count}", &QUESTION_COUNT.to_string())
        .replace("{total}", &TARGET_TOTAL_POINTS.to_string())
        .replace("{separator}", QUESTION_SEPARATOR)
        .replace("{title}", LABEL_TITLE)
        .replace("{question}", LABEL_QUESTION)
        .replace("{difficulty}", LABEL_DIFFICULTY)
        .replace("{points}", LABEL_POINTS)
        .replace("{criteria}", LABEL_CRITERIA)
        .replace("{no_fences}", NO_CODE_FENCES);
    // Phase 1 output and the resume are untrusted, fill them in one pass.
    let prompt = fill_placeholders(
        &prompt,
        &[
            ("{campaign_context}", campaign_context),
            ("{job_description}", context.job_description.trim()),
            ("{resume_section}", resume_section.as_str()),
        ],
    );
    with_reminder(prompt, strict)
}

/// Replaces each placeholder in a single left-to-right scan, so inserted
/// values are never searched for further placeholders.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn with_reminder(prompt: String, strict: bool) -> String {
    if strict {
        format!("{prompt}\n\n{STRICT_FORMAT_REMINDER}")
    } else {
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> CandidateContext {
        CandidateContext {
            job_description: "**Job Title:** Backend Engineer".to_string(),
            campaign_context: "Focus on distributed systems.".to_string(),
        }
    }

    #[test]
    fn test_context_prompt_embeds_resume_and_markers() {
        let prompt = build_context_analysis_prompt("5 years Python, AWS, Kubernetes", false);
        assert!(prompt.contains("5 years Python, AWS, Kubernetes"));
        for marker in [
            CAMPAIGN_CONTEXT_OPEN,
            CAMPAIGN_CONTEXT_CLOSE,
            JOB_DESCRIPTION_OPEN,
            JOB_DESCRIPTION_CLOSE,
        ] {
            assert!(prompt.contains(marker), "missing marker {marker}");
        }
        assert!(!prompt.contains("{resume_text}"));
        assert!(!prompt.contains(STRICT_FORMAT_REMINDER));
    }

    #[test]
    fn test_strict_prompt_appends_reminder() {
        let prompt = build_context_analysis_prompt("Rust", true);
        assert!(prompt.ends_with(STRICT_FORMAT_REMINDER));
    }

    #[test]
    fn test_resume_placeholders_are_not_expanded() {
        let prompt = build_context_analysis_prompt("literal {jd_open} in resume", false);
        assert!(prompt.contains("literal {jd_open} in resume"));
    }

    #[test]
    fn test_question_prompt_lists_every_label_and_band() {
        let prompt = build_question_generation_prompt(&context(), None, false);
        for label in [
            LABEL_TITLE,
            LABEL_QUESTION,
            LABEL_DIFFICULTY,
            LABEL_POINTS,
            LABEL_CRITERIA,
        ] {
            assert!(prompt.contains(&format!("{label}: <")), "missing label {label}");
        }
        assert!(prompt.contains(QUESTION_SEPARATOR));
        assert!(prompt.contains("exactly 10 questions"));
        assert!(prompt.contains("Easy questions: 3-7 points"));
        assert!(prompt.contains("Backend Engineer"));
        assert!(prompt.contains("Focus on distributed systems."));
        assert!(!prompt.contains("CANDIDATE RESUME"));
    }

    #[test]
    fn test_question_prompt_includes_resume_when_given() {
        let prompt = build_question_generation_prompt(&context(), Some("Kubernetes operator"), true);
        assert!(prompt.contains("CANDIDATE RESUME"));
        assert!(prompt.contains("Kubernetes operator"));
        assert!(prompt.ends_with(STRICT_FORMAT_REMINDER));
    }

    #[test]
    fn test_question_prompt_does_not_expand_placeholders_in_model_text() {
        let ctx = CandidateContext {
            job_description: "Platform role {resume_section} {campaign_context}".to_string(),
            campaign_context: "Dig into {job_description} depth".to_string(),
        };
        let prompt = build_question_generation_prompt(&ctx, Some("Go, gRPC"), false);
        assert!(prompt.contains("Platform role {resume_section} {campaign_context}"));
        assert!(prompt.contains("Dig into {job_description} depth"));
        assert_eq!(prompt.matches("CANDIDATE RESUME").count(), 1);
    }

    #[test]
    fn test_fill_placeholders_single_pass() {
        let out = fill_placeholders("{a} and {b} {c}", &[("{a}", "{b}"), ("{b}", "x")]);
        assert_eq!(out, "{b} and x {c}");
    }

    #[test]
    fn test_question_prompt_handles_missing_campaign_context() {
        let ctx = CandidateContext {
            campaign_context: String::new(),
            ..context()
        };
        let prompt = build_question_generation_prompt(&ctx, None, false);
        assert!(prompt.contains("(none provided)"));
    }
}
