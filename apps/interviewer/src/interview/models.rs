//! Interview data model: candidate context, difficulty bands and the question set.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Number of questions in a complete set.
pub const QUESTION_COUNT: usize = 10;

/// Point total the model is asked to hit. Not enforced.
pub const TARGET_TOTAL_POINTS: u32 = 100;

/// Difficulty of a single interview question. Each level owns a point band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Inclusive point band: Easy 3–7, Medium 7–10, Hard 10–15.
    pub fn band(self) -> RangeInclusive<u32> {
        match self {
            Difficulty::Easy => 3..=7,
            Difficulty::Medium => 7..=10,
            Difficulty::Hard => 10..=15,
        }
    }

    /// Clamps `points` to the nearest boundary of this difficulty's band.
    pub fn clamp_points(self, points: i64) -> u32 {
        let band = self.band();
        points.clamp(i64::from(*band.start()), i64::from(*band.end())) as u32
    }

    /// Case-insensitive match against the three level names.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(raw))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of Phase 1. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateContext {
    pub job_description: String,
    /// Interview focus areas. Empty when the model omitted the block.
    pub campaign_context: String,
}

/// One generated interview question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRecord {
    /// 1-based position in the final set.
    pub number: usize,
    pub title: Option<String>,
    pub text: String,
    pub difficulty: Difficulty,
    /// Always inside `difficulty.band()`.
    pub points: u32,
    pub scoring_criteria: String,
}

/// Exactly `QUESTION_COUNT` records in model-emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionSet {
    questions: Vec<QuestionRecord>,
}

impl QuestionSet {
    /// Builds a set from already-validated records. Callers guarantee the count.
    pub(crate) fn from_validated(questions: Vec<QuestionRecord>) -> Self {
        debug_assert_eq!(questions.len(), QUESTION_COUNT);
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn get(&self, index: usize) -> Option<&QuestionRecord> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.questions.iter()
    }

    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }

    pub fn count_of(&self, difficulty: Difficulty) -> usize {
        self.questions
            .iter()
            .filter(|q| q.difficulty == difficulty)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_match_scoring_rules() {
        assert_eq!(Difficulty::Easy.band(), 3..=7);
        assert_eq!(Difficulty::Medium.band(), 7..=10);
        assert_eq!(Difficulty::Hard.band(), 10..=15);
    }

    #[test]
    fn test_clamp_points_to_nearest_boundary() {
        assert_eq!(Difficulty::Easy.clamp_points(20), 7);
        assert_eq!(Difficulty::Easy.clamp_points(1), 3);
        assert_eq!(Difficulty::Medium.clamp_points(8), 8);
        assert_eq!(Difficulty::Hard.clamp_points(-4), 10);
        assert_eq!(Difficulty::Hard.clamp_points(99), 15);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Difficulty::parse("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse(" MEDIUM "), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse("Hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("expert"), None);
        assert_eq!(Difficulty::parse(""), None);
    }

    #[test]
    fn test_difficulty_serializes_as_name() {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, r#""Medium""#);
    }
}
