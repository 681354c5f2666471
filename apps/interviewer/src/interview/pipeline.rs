//! Phase runners: prompt → model → parser, with one strict re-ask on a
//! malformed answer.
//!
//! Model-client errors are returned unchanged; the client already retried
//! what was retryable.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::interview::models::{CandidateContext, Difficulty, QuestionSet, TARGET_TOTAL_POINTS};
use crate::interview::parser::{parse_context_response, parse_question_response, ParseError};
use crate::interview::prompts::{
    build_context_analysis_prompt, build_question_generation_prompt, CONTEXT_ANALYSIS_SYSTEM,
    QUESTION_GENERATION_SYSTEM,
};
use crate::llm_client::{LlmError, ModelClient};

/// Attempts per phase: the normal prompt, then the strict one.
const PHASE_ATTEMPTS: u32 = 2;

#[derive(Debug, Error, PartialEq)]
pub enum PhaseError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Phase 1: resume text → job description + campaign context.
pub async fn run_context_analysis(
    llm: &ModelClient,
    resume_text: &str,
) -> Result<CandidateContext, PhaseError> {
    let mut last_error = None;

    for attempt in 0..PHASE_ATTEMPTS {
        let strict = attempt > 0;
        let prompt = build_context_analysis_prompt(resume_text, strict);
        let raw = llm.send(&prompt, CONTEXT_ANALYSIS_SYSTEM).await?;

        match parse_context_response(&raw) {
            Ok(context) => {
                info!(
                    "Phase 1 complete: job description of {} chars",
                    context.job_description.len()
                );
                return Ok(context);
            }
            Err(e) => {
                warn!(
                    "Phase 1 attempt {}/{} returned a malformed answer: {}",
                    attempt + 1,
                    PHASE_ATTEMPTS,
                    e
                );
                debug!("Raw phase 1 output: {}", raw);
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| ParseError::Malformed("no attempt made".to_string()))
        .into())
}

/// Phase 2: candidate context → exactly ten scored questions.
pub async fn run_question_generation(
    llm: &ModelClient,
    context: &CandidateContext,
    resume_text: Option<&str>,
) -> Result<QuestionSet, PhaseError> {
    let mut last_error = None;

    for attempt in 0..PHASE_ATTEMPTS {
        let strict = attempt > 0;
        let prompt = build_question_generation_prompt(context, resume_text, strict);
        let raw = llm.send(&prompt, QUESTION_GENERATION_SYSTEM).await?;

        match parse_question_response(&raw) {
            Ok(questions) => {
                log_question_summary(&questions);
                return Ok(questions);
            }
            Err(e) => {
                warn!(
                    "Phase 2 attempt {}/{} failed validation: {}",
                    attempt + 1,
                    PHASE_ATTEMPTS,
                    e
                );
                debug!("Raw phase 2 output: {}", raw);
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| ParseError::Malformed("no attempt made".to_string()))
        .into())
}

fn log_question_summary(questions: &QuestionSet) {
    let total = questions.total_points();
    info!(
        "Phase 2 complete: {} questions (easy={}, medium={}, hard={}), {} points",
        questions.len(),
        questions.count_of(Difficulty::Easy),
        questions.count_of(Difficulty::Medium),
        questions.count_of(Difficulty::Hard),
        total
    );
    if total != TARGET_TOTAL_POINTS {
        warn!(
            "Question set totals {} points, expected {}",
            total, TARGET_TOTAL_POINTS
        );
    }
    if Difficulty::ALL
        .iter()
        .any(|d| questions.count_of(*d) == questions.len())
    {
        warn!("All questions share one difficulty level");
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A phase 1 answer mentioning the resume's skills.
    pub fn context_answer() -> String {
        "<<<CAMPAIGN_CONTEXT>>>\nCloud-native backend work on AWS.\n<<<END_CAMPAIGN_CONTEXT>>>\n\
         <<<JOB_DESCRIPTION>>>\n**Job Title:** Senior Python Engineer\n\n\
         **Qualifications:**\n- 5+ years Python\n- AWS and Kubernetes in production\n\
         <<<END_JOB_DESCRIPTION>>>"
            .to_string()
    }

    /// A phase 2 answer with `n` valid records totalling 100 points when n = 10.
    pub fn questions_answer(n: usize) -> String {
        let plan = [
            ("Easy", 5),
            ("Easy", 5),
            ("Easy", 6),
            ("Medium", 8),
            ("Medium", 8),
            ("Medium", 10),
            ("Hard", 13),
            ("Hard", 15),
            ("Hard", 15),
            ("Hard", 15),
        ];
        (0..n)
            .map(|i| {
                let (level, points) = plan[i % plan.len()];
                format!(
                    "### QUESTION\nTITLE: Topic {n}\nQUESTION: Question {n} about Kubernetes?\n\
                     DIFFICULTY: {level}\nPOINTS: {points}\nCRITERIA: Covers point {n}.\n",
                    n = i + 1
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::fixtures::{context_answer, questions_answer};
    use super::*;
    use crate::llm_client::prompts::STRICT_FORMAT_REMINDER;
    use crate::llm_client::testing::{test_policy, ScriptedGenerator};

    fn client(generator: &Arc<ScriptedGenerator>) -> ModelClient {
        ModelClient::new(generator.clone(), test_policy())
    }

    fn context() -> CandidateContext {
        CandidateContext {
            job_description: "Senior Python Engineer".to_string(),
            campaign_context: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_analysis_parses_first_answer() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(context_answer())]));
        let ctx = run_context_analysis(&client(&generator), "5 years Python")
            .await
            .unwrap();
        assert!(ctx.job_description.contains("Python"));
        assert_eq!(ctx.campaign_context, "Cloud-native backend work on AWS.");
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_context_is_retried_once_with_strict_prompt() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok("Here is a job description without markers".to_string()),
            Ok(context_answer()),
        ]));
        let ctx = run_context_analysis(&client(&generator), "5 years Python")
            .await
            .unwrap();
        assert!(ctx.job_description.contains("Senior Python Engineer"));

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[0].contains(STRICT_FORMAT_REMINDER));
        assert!(prompts[1].contains(STRICT_FORMAT_REMINDER));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_context_twice_surfaces_parse_error() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok("no markers".to_string())]));
        let err = run_context_analysis(&client(&generator), "5 years Python")
            .await
            .unwrap_err();
        assert!(matches!(err, PhaseError::Parse(ParseError::Malformed(_))));
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_absorbed_inside_context_analysis() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(LlmError::Transient("503".to_string())),
            Err(LlmError::Transient("503".to_string())),
            Ok(context_answer()),
        ]));
        let ctx = run_context_analysis(&client(&generator), "5 years Python")
            .await
            .unwrap();
        assert!(!ctx.job_description.is_empty());
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_errors_are_not_retried_at_phase_level() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(
            LlmError::EmptyResponse("no candidates".to_string()),
        )]));
        let err = run_context_analysis(&client(&generator), "5 years Python")
            .await
            .unwrap_err();
        assert!(matches!(err, PhaseError::Llm(LlmError::EmptyResponse(_))));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_question_generation_returns_ten() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(questions_answer(10))]));
        let questions = run_question_generation(&client(&generator), &context(), None)
            .await
            .unwrap();
        assert_eq!(questions.len(), 10);
        assert_eq!(questions.total_points(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insufficient_questions_retried_once() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok(questions_answer(7)),
            Ok(questions_answer(12)),
        ]));
        let questions = run_question_generation(&client(&generator), &context(), Some("resume"))
            .await
            .unwrap();
        assert_eq!(questions.len(), 10);
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insufficient_questions_twice_surfaces() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(questions_answer(4))]));
        let err = run_question_generation(&client(&generator), &context(), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PhaseError::Parse(ParseError::InsufficientQuestions {
                found: 4,
                expected: 10
            })
        );
    }
}
