//! Axum route handlers for the Session API.
//!
//! Every handler locks the single session for the whole action, so at most
//! one phase transition is in flight at a time.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::interview::models::QuestionRecord;
use crate::session::SessionView;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct QuestionListResponse {
    pub questions: Vec<QuestionRecord>,
    pub total_points: u32,
}

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.session.lock().await.view())
}

/// POST /api/v1/session/upload
///
/// Multipart body with a `file` field holding the resume PDF.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read uploaded file: {e}")))?;
        upload = Some((file_name, bytes));
    }

    // An empty file still goes through the session: upload discards the
    // held data and the extractor rejects the bytes.
    let (file_name, bytes) = upload
        .ok_or_else(|| AppError::Validation("multipart field 'file' is required".to_string()))?;

    info!(
        "Resume upload received: {:?} ({} bytes)",
        file_name,
        bytes.len()
    );

    let mut session = state.session.lock().await;
    session.upload(file_name, bytes).await?;
    Ok(Json(session.view()))
}

/// POST /api/v1/session/analyze
pub async fn handle_analyze(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.analyze().await?;
    Ok(Json(session.view()))
}

/// POST /api/v1/session/generate
pub async fn handle_generate(
    State(state): State<AppState>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.generate().await?;
    Ok(Json(session.view()))
}

/// POST /api/v1/session/next
pub async fn handle_next(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.next()?;
    Ok(Json(session.view()))
}

/// POST /api/v1/session/prev
pub async fn handle_prev(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.prev()?;
    Ok(Json(session.view()))
}

/// POST /api/v1/session/reset
pub async fn handle_reset(State(state): State<AppState>) -> Json<SessionView> {
    let mut session = state.session.lock().await;
    session.reset();
    Json(session.view())
}

/// GET /api/v1/session/questions
///
/// The whole set in presentation order, for printing a scoring sheet.
pub async fn handle_list_questions(
    State(state): State<AppState>,
) -> Result<Json<QuestionListResponse>, AppError> {
    let session = state.session.lock().await;
    let questions = session.questions().ok_or_else(|| {
        AppError::InvalidTransition(format!(
            "No questions generated yet (session is {})",
            session.stage()
        ))
    })?;

    Ok(Json(QuestionListResponse {
        questions: questions.iter().cloned().collect(),
        total_points: questions.total_points(),
    }))
}
