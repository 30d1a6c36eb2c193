//! Forum API Endpoints
//!
//! Question and answer lifecycle over HTTP: staked question creation,
//! answer submission, validation by owner or staff, likes, moderation
//! deletion.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::forum::models::{AnswerRecord, QuestionRecord};
use crate::forum::{ArbitrationEngine, ValidationOutcome};

/// API state for forum endpoints
#[derive(Clone)]
pub struct ForumApiState {
    pub engine: ArbitrationEngine,
}

// Request/response types

#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub title: String,
    pub subject: String,
    pub class_level: String,
    pub stake: i64,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionDetailResponse {
    pub question: QuestionRecord,
    pub answers: Vec<AnswerRecord>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub answer_id: Uuid,
    pub likes: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteAnswerResponse {
    pub answer_id: Uuid,
    pub deleted: bool,
}

// Endpoints

/// POST /questions - Open a question, escrowing the point stake
pub async fn create_question(
    State(state): State<ForumApiState>,
    auth: AuthUser,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<QuestionRecord>)> {
    let question = state
        .engine
        .create_question(
            auth.user_id,
            payload.title,
            payload.subject,
            payload.class_level,
            payload.stake,
            payload.attachments,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// GET /questions/{question_id} - Question with its answers, public
pub async fn get_question(
    State(state): State<ForumApiState>,
    Path(question_id): Path<Uuid>,
) -> Result<Json<QuestionDetailResponse>> {
    let (question, answers) = state.engine.question_with_answers(question_id).await?;
    Ok(Json(QuestionDetailResponse { question, answers }))
}

/// POST /questions/{question_id}/answers - Submit an answer
pub async fn submit_answer(
    State(state): State<ForumApiState>,
    auth: AuthUser,
    Path(question_id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<(StatusCode, Json<AnswerRecord>)> {
    let answer = state
        .engine
        .submit_answer(question_id, auth.user_id, payload.content, payload.attachments)
        .await?;
    Ok((StatusCode::CREATED, Json(answer)))
}

/// POST /answers/{answer_id}/validate - Owner selection or staff endorsement
pub async fn validate_answer(
    State(state): State<ForumApiState>,
    auth: AuthUser,
    Path(answer_id): Path<Uuid>,
) -> Result<Json<ValidationOutcome>> {
    let outcome = state
        .engine
        .validate_answer(answer_id, auth.user_id, auth.role)
        .await?;
    Ok(Json(outcome))
}

/// POST /answers/{answer_id}/like - Like someone else's answer
pub async fn like_answer(
    State(state): State<ForumApiState>,
    auth: AuthUser,
    Path(answer_id): Path<Uuid>,
) -> Result<Json<LikeResponse>> {
    let likes = state.engine.like_answer(answer_id, auth.user_id).await?;
    Ok(Json(LikeResponse { answer_id, likes }))
}

/// DELETE /answers/{answer_id} - Moderation removal
pub async fn delete_answer(
    State(state): State<ForumApiState>,
    auth: AuthUser,
    Path(answer_id): Path<Uuid>,
) -> Result<Json<DeleteAnswerResponse>> {
    state
        .engine
        .delete_answer(answer_id, auth.user_id, auth.role)
        .await?;
    Ok(Json(DeleteAnswerResponse { answer_id, deleted: true }))
}

/// Create the forum API router
pub fn create_forum_router(state: ForumApiState) -> Router {
    Router::new()
        .route("/questions", post(create_question))
        .route("/questions/{question_id}", get(get_question))
        .route("/questions/{question_id}/answers", post(submit_answer))
        .route("/answers/{answer_id}/validate", post(validate_answer))
        .route("/answers/{answer_id}/like", post(like_answer))
        .route("/answers/{answer_id}", delete(delete_answer))
        .with_state(state)
}
