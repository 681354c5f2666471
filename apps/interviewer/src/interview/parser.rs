//! Response Parser: turns raw model text into typed, bounded interview data.
//!
//! The model is not a contract-bound API, so parsing is lenient about
//! decoration (code fences, markdown bold, bullets, label case) and strict
//! about content: a question record that cannot be validated is dropped on
//! its own, never the whole response.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::interview::models::{
    CandidateContext, Difficulty, QuestionRecord, QuestionSet, QUESTION_COUNT,
};
use crate::interview::prompts::{
    CAMPAIGN_CONTEXT_CLOSE, CAMPAIGN_CONTEXT_OPEN, JOB_DESCRIPTION_CLOSE, JOB_DESCRIPTION_OPEN,
    LABEL_CRITERIA, LABEL_DIFFICULTY, LABEL_POINTS, LABEL_QUESTION, LABEL_TITLE,
};

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Malformed model response: {0}")]
    Malformed(String),

    #[error("Expected {expected} valid questions, model produced {found}")]
    InsufficientQuestions { found: usize, expected: usize },
}

// ────────────────────────────────────────────────────────────────────────────
// Phase 1
// ────────────────────────────────────────────────────────────────────────────

/// Extracts the job description (required) and campaign context (optional).
pub fn parse_context_response(raw: &str) -> Result<CandidateContext, ParseError> {
    let text = strip_code_fences(raw);

    let job_description = extract_marked(text, JOB_DESCRIPTION_OPEN, JOB_DESCRIPTION_CLOSE)
        .ok_or_else(|| {
            ParseError::Malformed(format!("missing {JOB_DESCRIPTION_OPEN} section"))
        })?;
    if job_description.is_empty() {
        return Err(ParseError::Malformed(
            "job description section is empty".to_string(),
        ));
    }

    let campaign_context =
        extract_marked(text, CAMPAIGN_CONTEXT_OPEN, CAMPAIGN_CONTEXT_CLOSE).unwrap_or_default();
    if campaign_context.is_empty() {
        debug!("Model response had no campaign context block");
    }

    Ok(CandidateContext {
        job_description,
        campaign_context,
    })
}

/// Returns the trimmed text between `open` and `close`. A missing `close` is
/// repaired by stopping at the next `<<<` marker or the end of the text.
fn extract_marked(text: &str, open: &str, close: &str) -> Option<String> {
    let start = text.find(open)? + open.len();
    let rest = &text[start..];
    let end = rest
        .find(close)
        .or_else(|| rest.find("<<<"))
        .unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Phase 2
// ────────────────────────────────────────────────────────────────────────────

/// Fields of one record as the model wrote them, before validation.
#[derive(Debug, Default)]
struct RawRecord {
    title: Option<String>,
    text: Option<String>,
    difficulty: Option<String>,
    points: Option<String>,
    criteria: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Question,
    Difficulty,
    Points,
    Criteria,
}

impl RawRecord {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Question => &mut self.text,
            Field::Difficulty => &mut self.difficulty,
            Field::Points => &mut self.points,
            Field::Criteria => &mut self.criteria,
        }
    }

    fn push(&mut self, field: Field, line: &str) {
        if line.is_empty() {
            return;
        }
        let slot = self.slot(field);
        if let Some(existing) = slot.as_mut() {
            if !existing.is_empty() {
                existing.push('\n');
            }
            existing.push_str(line);
            return;
        }
        *slot = Some(line.to_string());
    }
}

/// Why a record was dropped. Only used for logging.
#[derive(Debug, PartialEq)]
enum Rejection {
    MissingText,
    MissingCriteria,
    UnknownDifficulty(String),
    InvalidPoints(String),
}

/// Splits the response into records, validates each, and returns exactly
/// `QUESTION_COUNT` questions or `InsufficientQuestions`.
pub fn parse_question_response(raw: &str) -> Result<QuestionSet, ParseError> {
    let blocks = split_records(strip_code_fences(raw));
    let total_blocks = blocks.len();

    let mut valid: Vec<QuestionRecord> = Vec::with_capacity(QUESTION_COUNT);
    for (index, block) in blocks.into_iter().enumerate() {
        match validate_record(block) {
            Ok(record) => valid.push(record),
            Err(reason) => warn!("Dropping question block {}: {:?}", index + 1, reason),
        }
    }

    if valid.len() < QUESTION_COUNT {
        return Err(ParseError::InsufficientQuestions {
            found: valid.len(),
            expected: QUESTION_COUNT,
        });
    }
    if valid.len() > QUESTION_COUNT {
        debug!(
            "Model produced {} valid questions, keeping the first {}",
            valid.len(),
            QUESTION_COUNT
        );
        valid.truncate(QUESTION_COUNT);
    }

    debug!(
        "Parsed {} questions from {} blocks",
        valid.len(),
        total_blocks
    );

    for (i, record) in valid.iter_mut().enumerate() {
        record.number = i + 1;
    }
    Ok(QuestionSet::from_validated(valid))
}

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Optional bullet / bold decoration, then LABEL, optional closing bold, colon.
        let pattern = format!(
            r"(?i)^[\s>*\-]*(?:\*\*|__)?\s*({}|{}|{}|{}|{})\s*(?:\*\*|__)?\s*:\s*(?:\*\*|__)?\s*(.*)$",
            LABEL_TITLE, LABEL_QUESTION, LABEL_DIFFICULTY, LABEL_POINTS, LABEL_CRITERIA
        );
        Regex::new(&pattern).expect("label pattern is valid")
    })
}

fn leading_integer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+\-]?\d+").expect("integer pattern is valid"))
}

/// Matches `### QUESTION`, `### Question 3`, `**Question 3**` and
/// `Question 3:`. A bare `QUESTION:` stays a label line.
fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"(?i)^\s*(?:#+\s*{q}\s*\d*|(?:\*\*|__)?\s*{q}\s+\d+)\s*[:.)]?\s*(?:\*\*|__)?\s*$",
            q = LABEL_QUESTION
        );
        Regex::new(&pattern).expect("separator pattern is valid")
    })
}

fn is_separator(line: &str) -> bool {
    separator_regex().is_match(line)
}

fn split_records(text: &str) -> Vec<RawRecord> {
    let mut records = Vec::new();
    let mut current: Option<RawRecord> = None;
    let mut open_field: Option<Field> = None;

    for line in text.lines() {
        if is_separator(line) {
            if let Some(done) = current.take() {
                records.push(done);
            }
            current = Some(RawRecord::default());
            open_field = None;
            continue;
        }

        // Prose before the first separator is ignored.
        let Some(record) = current.as_mut() else {
            continue;
        };

        if let Some(caps) = label_regex().captures(line) {
            let field = match caps[1].to_ascii_uppercase().as_str() {
                LABEL_TITLE => Field::Title,
                LABEL_QUESTION => Field::Question,
                LABEL_DIFFICULTY => Field::Difficulty,
                LABEL_POINTS => Field::Points,
                _ => Field::Criteria,
            };
            let slot = record.slot(field);
            if slot.as_deref().is_some_and(|v| !v.trim().is_empty()) {
                // Field already filled: the line belongs to the open field,
                // e.g. a "- points: ..." bullet inside the criteria.
                if let Some(open) = open_field {
                    record.push(open, line.trim());
                }
                continue;
            }
            let value = strip_trailing_bold(caps[2].trim());
            *slot = Some(value.to_string());
            open_field = Some(field);
        } else if let Some(field) = open_field {
            record.push(field, line.trim());
        }
    }

    if let Some(done) = current {
        records.push(done);
    }
    records
}

fn strip_trailing_bold(value: &str) -> &str {
    value
        .strip_suffix("**")
        .or_else(|| value.strip_suffix("__"))
        .map(str::trim_end)
        .unwrap_or(value)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_record(raw: RawRecord) -> Result<QuestionRecord, Rejection> {
    let text = non_blank(raw.text).ok_or(Rejection::MissingText)?;
    let scoring_criteria = non_blank(raw.criteria).ok_or(Rejection::MissingCriteria)?;

    let difficulty_raw = raw.difficulty.unwrap_or_default();
    let difficulty = Difficulty::parse(&difficulty_raw)
        .ok_or_else(|| Rejection::UnknownDifficulty(difficulty_raw.clone()))?;

    let points_raw = raw.points.unwrap_or_default();
    let points = leading_integer_regex()
        .find(points_raw.trim())
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(|| Rejection::InvalidPoints(points_raw.clone()))?;
    let clamped = difficulty.clamp_points(points);
    if i64::from(clamped) != points {
        debug!(
            "Clamped {} question points from {} to {}",
            difficulty, points, clamped
        );
    }

    Ok(QuestionRecord {
        number: 0,
        title: non_blank(raw.title),
        text,
        difficulty,
        points: clamped,
        scoring_criteria,
    })
}

/// Strips a ```lang ... ``` wrapper if the model added one anyway.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (```text, ```markdown, ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}
