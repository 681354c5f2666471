//! Session Orchestrator: the explicit state machine behind the interview flow.
//!
//! ```text
//! Empty ─upload─▶ DocumentLoaded ─analyze─▶ ContextReady ─generate─▶ QuestionsReady
//!                                                                      │ next
//!                                                                      ▼
//!                                                   Reviewing(i) ◀─next/prev─▶ Reviewing(i±1)
//! ```
//!
//! A transition either fully succeeds or leaves the previous state untouched.
//! Phase transitions compute their result while only borrowing the state and
//! swap it in afterwards, so a dropped request future cannot leave a partial
//! session behind.

pub mod handlers;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::extraction::{extract_blocking, DocumentExtractor, ExtractionError};
use crate::interview::models::{CandidateContext, QuestionRecord, QuestionSet};
use crate::interview::parser::ParseError;
use crate::interview::pipeline::{run_context_analysis, run_question_generation, PhaseError};
use crate::llm_client::{LlmError, ModelClient};

/// The six actions the presentation layer can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Upload,
    Analyze,
    Generate,
    Next,
    Prev,
    Reset,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Upload => "upload",
            Action::Analyze => "analyze",
            Action::Generate => "generate",
            Action::Next => "next",
            Action::Prev => "prev",
            Action::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// State names, as exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Empty,
    DocumentLoaded,
    ContextReady,
    QuestionsReady,
    Reviewing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Empty => "empty",
            Stage::DocumentLoaded => "document_loaded",
            Stage::ContextReady => "context_ready",
            Stage::QuestionsReady => "questions_ready",
            Stage::Reviewing => "reviewing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot {action} while the session is {stage}")]
    InvalidTransition { action: Action, stage: Stage },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<PhaseError> for SessionError {
    fn from(err: PhaseError) -> Self {
        match err {
            PhaseError::Llm(e) => SessionError::Llm(e),
            PhaseError::Parse(e) => SessionError::Parse(e),
        }
    }
}

/// The uploaded document and its extracted text.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub session_id: Uuid,
    pub file_name: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub bytes: Bytes,
    pub text: String,
}

#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    Empty,
    DocumentLoaded {
        document: LoadedDocument,
    },
    ContextReady {
        document: LoadedDocument,
        context: CandidateContext,
    },
    QuestionsReady {
        document: LoadedDocument,
        context: CandidateContext,
        questions: QuestionSet,
    },
    Reviewing {
        document: LoadedDocument,
        context: CandidateContext,
        questions: QuestionSet,
        /// Always `< questions.len()`.
        cursor: usize,
    },
}

impl SessionState {
    pub fn stage(&self) -> Stage {
        match self {
            SessionState::Empty => Stage::Empty,
            SessionState::DocumentLoaded { .. } => Stage::DocumentLoaded,
            SessionState::ContextReady { .. } => Stage::ContextReady,
            SessionState::QuestionsReady { .. } => Stage::QuestionsReady,
            SessionState::Reviewing { .. } => Stage::Reviewing,
        }
    }

    fn document(&self) -> Option<&LoadedDocument> {
        match self {
            SessionState::Empty => None,
            SessionState::DocumentLoaded { document }
            | SessionState::ContextReady { document, .. }
            | SessionState::QuestionsReady { document, .. }
            | SessionState::Reviewing { document, .. } => Some(document),
        }
    }

    fn context(&self) -> Option<&CandidateContext> {
        match self {
            SessionState::ContextReady { context, .. }
            | SessionState::QuestionsReady { context, .. }
            | SessionState::Reviewing { context, .. } => Some(context),
            _ => None,
        }
    }

    fn questions(&self) -> Option<&QuestionSet> {
        match self {
            SessionState::QuestionsReady { questions, .. }
            | SessionState::Reviewing { questions, .. } => Some(questions),
            _ => None,
        }
    }

    fn cursor(&self) -> Option<usize> {
        match self {
            SessionState::QuestionsReady { .. } => Some(0),
            SessionState::Reviewing { cursor, .. } => Some(*cursor),
            _ => None,
        }
    }
}

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub stage: Stage,
    pub session_id: Option<Uuid>,
    pub file_name: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub document_bytes: Option<usize>,
    pub job_description: Option<String>,
    pub campaign_context: Option<String>,
    pub current_question: Option<QuestionRecord>,
    pub cursor: Option<usize>,
    pub total_questions: usize,
    pub total_points: Option<u32>,
}

/// One user's interview session. Owns its state exclusively.
pub struct Session {
    state: SessionState,
    extractor: Arc<dyn DocumentExtractor>,
    llm: ModelClient,
}

impl Session {
    pub fn new(extractor: Arc<dyn DocumentExtractor>, llm: ModelClient) -> Self {
        Self {
            state: SessionState::Empty,
            extractor,
            llm,
        }
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.state.cursor()
    }

    pub fn questions(&self) -> Option<&QuestionSet> {
        self.state.questions()
    }

    fn invalid(&self, action: Action) -> SessionError {
        SessionError::InvalidTransition {
            action,
            stage: self.stage(),
        }
    }

    /// Any state → DocumentLoaded. Held data is discarded first; on
    /// extraction failure the session stays `Empty`.
    pub async fn upload(
        &mut self,
        file_name: Option<String>,
        bytes: Bytes,
    ) -> Result<(), SessionError> {
        let from = self.stage();
        self.state = SessionState::Empty;

        let text = extract_blocking(self.extractor.clone(), bytes.clone()).await?;
        let document = LoadedDocument {
            session_id: Uuid::new_v4(),
            file_name,
            uploaded_at: Utc::now(),
            bytes,
            text,
        };
        info!(
            "Session {} loaded document {:?}",
            document.session_id, document.file_name
        );
        self.state = SessionState::DocumentLoaded { document };
        log_transition(Action::Upload, from, self.stage());
        Ok(())
    }

    /// DocumentLoaded → ContextReady (Phase 1).
    pub async fn analyze(&mut self) -> Result<(), SessionError> {
        let context = match &self.state {
            SessionState::DocumentLoaded { document } => {
                run_context_analysis(&self.llm, &document.text).await?
            }
            _ => return Err(self.invalid(Action::Analyze)),
        };

        self.state = match std::mem::take(&mut self.state) {
            SessionState::DocumentLoaded { document } => {
                SessionState::ContextReady { document, context }
            }
            other => other,
        };
        log_transition(Action::Analyze, Stage::DocumentLoaded, self.stage());
        Ok(())
    }

    /// ContextReady → QuestionsReady (Phase 2). From QuestionsReady or
    /// Reviewing this regenerates the set; a failure keeps the old one.
    pub async fn generate(&mut self) -> Result<(), SessionError> {
        let from = self.stage();
        let questions = match &self.state {
            SessionState::ContextReady { document, context }
            | SessionState::QuestionsReady {
                document, context, ..
            }
            | SessionState::Reviewing {
                document, context, ..
            } => run_question_generation(&self.llm, context, Some(&document.text)).await?,
            _ => return Err(self.invalid(Action::Generate)),
        };

        self.state = match std::mem::take(&mut self.state) {
            SessionState::ContextReady { document, context }
            | SessionState::QuestionsReady {
                document, context, ..
            }
            | SessionState::Reviewing {
                document, context, ..
            } => SessionState::QuestionsReady {
                document,
                context,
                questions,
            },
            other => other,
        };
        log_transition(Action::Generate, from, self.stage());
        Ok(())
    }

    /// QuestionsReady/Reviewing(i) → Reviewing(i+1); no-op at the last question.
    pub fn next(&mut self) -> Result<usize, SessionError> {
        self.navigate(Action::Next)
    }

    /// Reviewing(i) → Reviewing(i-1); no-op at the first question.
    pub fn prev(&mut self) -> Result<usize, SessionError> {
        self.navigate(Action::Prev)
    }

    fn navigate(&mut self, action: Action) -> Result<usize, SessionError> {
        let Some(cursor) = self.state.cursor() else {
            return Err(self.invalid(action));
        };
        let len = self.state.questions().map_or(0, QuestionSet::len);
        let from = self.stage();

        let target = match action {
            Action::Next if cursor + 1 < len => cursor + 1,
            Action::Prev if cursor >= 1 => cursor - 1,
            _ => return Ok(cursor),
        };

        self.state = match std::mem::take(&mut self.state) {
            SessionState::QuestionsReady {
                document,
                context,
                questions,
            }
            | SessionState::Reviewing {
                document,
                context,
                questions,
                ..
            } => SessionState::Reviewing {
                document,
                context,
                questions,
                cursor: target,
            },
            other => other,
        };
        log_transition(action, from, self.stage());
        Ok(target)
    }

    /// Any state → Empty.
    pub fn reset(&mut self) {
        let from = self.stage();
        if let Some(document) = self.state.document() {
            info!("Session {} reset", document.session_id);
        }
        self.state = SessionState::Empty;
        log_transition(Action::Reset, from, self.stage());
    }

    pub fn view(&self) -> SessionView {
        let document = self.state.document();
        let context = self.state.context();
        let questions = self.state.questions();
        let cursor = self.state.cursor();

        SessionView {
            stage: self.stage(),
            session_id: document.map(|d| d.session_id),
            file_name: document.and_then(|d| d.file_name.clone()),
            uploaded_at: document.map(|d| d.uploaded_at),
            document_bytes: document.map(|d| d.bytes.len()),
            job_description: context.map(|c| c.job_description.clone()),
            campaign_context: context
                .map(|c| c.campaign_context.clone())
                .filter(|c| !c.is_empty()),
            current_question: questions
                .zip(cursor)
                .and_then(|(q, i)| q.get(i).cloned()),
            cursor,
            total_questions: questions.map_or(0, QuestionSet::len),
            total_points: questions.map(QuestionSet::total_points),
        }
    }
}

fn log_transition(action: Action, from: Stage, to: Stage) {
    debug!("Session {}: {} -> {}", action, from, to);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::llm_client::testing::{test_policy, ScriptedGenerator};

    /// Treats `%PDF-`-prefixed bytes as a text-bearing PDF whose text is the
    /// remainder of the stream.
    pub struct SyntheticPdfExtractor;

    impl DocumentExtractor for SyntheticPdfExtractor {
        fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
            let body = bytes
                .strip_prefix(b"%PDF-1.4\n".as_slice())
                .ok_or(ExtractionError::NotPdf)?;
            String::from_utf8(body.to_vec())
                .map_err(|e| ExtractionError::Unreadable(e.to_string()))
        }
    }

    pub fn synthetic_pdf(text: &str) -> Bytes {
        Bytes::from(format!("%PDF-1.4\n{text}"))
    }

    pub fn session_with(generator: Arc<ScriptedGenerator>) -> Session {
        Session::new(
            Arc::new(SyntheticPdfExtractor),
            ModelClient::new(generator, test_policy()),
        )
    }
}
