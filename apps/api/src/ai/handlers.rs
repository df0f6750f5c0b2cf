//! Axum route handlers for the AI actions.
//!
//! Every handler runs `prepare_model` first, so plan gating and the rate limit apply
//! before any prompt is built.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::ai::actions::{self, CoverLetter, ProjectPointsRequest, ResumeScore, WorkPointsRequest};
use crate::ai::model_selection::AiConfig;
use crate::ai::prepare_model;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::repo::get_job;
use crate::llm_client::ChatMessage;
use crate::models::job::{JobDraft, JobRow};
use crate::models::resume::ResumeRow;
use crate::models::sections::{Project, SectionContent, WorkExperience};
use crate::resumes::handlers::owned_resume;
use crate::resumes::repo::save_cover_letter;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// An action input plus the caller's model choice.
#[derive(Debug, Deserialize)]
pub struct AiRequest<T> {
    #[serde(flatten)]
    pub input: T,
    #[serde(default)]
    pub ai_config: AiConfig,
}

#[derive(Debug, Deserialize)]
pub struct TailorInput {
    pub resume_id: Uuid,
    pub job_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ImproveExperienceInput {
    pub entry: WorkExperience,
    #[serde(default)]
    pub custom_prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct ImproveProjectInput {
    pub project: Project,
    #[serde(default)]
    pub custom_prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct ResumeInput {
    pub resume_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ChatInput {
    pub resume_id: Uuid,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct CoverLetterInput {
    #[serde(default)]
    pub custom_prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct TextInput {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PointsResponse {
    pub points: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
}

/// The resume as the model sees it: identity, role and content, no layout.
pub fn resume_prompt_json(resume: &ResumeRow) -> serde_json::Value {
    json!({
        "name": resume.name,
        "target_role": resume.target_role,
        "contact": resume.contact(),
        "sections": resume.sections(),
    })
}

async fn owned_job(state: &AppState, user_id: Uuid, job_id: Uuid) -> Result<JobRow, AppError> {
    get_job(&state.db, user_id, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

pub fn require_text(text: &str, field: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/ai/tailor
///
/// Returns tailored sections. Nothing is saved; the client creates the tailored resume.
pub async fn handle_tailor_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AiRequest<TailorInput>>,
) -> Result<Json<SectionContent>, AppError> {
    let (resume, job) = tokio::try_join!(
        owned_resume(&state, user.id, request.input.resume_id),
        owned_job(&state, user.id, request.input.job_id),
    )?;
    let target = prepare_model(&state, user.id, &request.ai_config).await?;

    let tailored =
        actions::tailor_resume_to_job(&state.llm, &target, &resume.sections(), &job).await?;
    info!("Tailored resume {} to job {}", resume.id, job.id);
    Ok(Json(tailored))
}

/// POST /api/v1/ai/work-experience/points
pub async fn handle_work_experience_points(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AiRequest<WorkPointsRequest>>,
) -> Result<Json<PointsResponse>, AppError> {
    require_text(&request.input.position, "position")?;
    let target = prepare_model(&state, user.id, &request.ai_config).await?;
    let points = actions::generate_work_experience_points(&state.llm, &target, &request.input).await?;
    Ok(Json(PointsResponse { points }))
}

/// POST /api/v1/ai/work-experience/improve
pub async fn handle_improve_work_experience(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AiRequest<ImproveExperienceInput>>,
) -> Result<Json<WorkExperience>, AppError> {
    let target = prepare_model(&state, user.id, &request.ai_config).await?;
    let improved = actions::improve_work_experience(
        &state.llm,
        &target,
        &request.input.entry,
        &request.input.custom_prompt,
    )
    .await?;
    Ok(Json(improved))
}

/// POST /api/v1/ai/projects/points
pub async fn handle_project_points(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AiRequest<ProjectPointsRequest>>,
) -> Result<Json<PointsResponse>, AppError> {
    require_text(&request.input.name, "name")?;
    let target = prepare_model(&state, user.id, &request.ai_config).await?;
    let points = actions::generate_project_points(&state.llm, &target, &request.input).await?;
    Ok(Json(PointsResponse { points }))
}

/// POST /api/v1/ai/projects/improve
pub async fn handle_improve_project(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AiRequest<ImproveProjectInput>>,
) -> Result<Json<Project>, AppError> {
    let target = prepare_model(&state, user.id, &request.ai_config).await?;
    let improved = actions::improve_project(
        &state.llm,
        &target,
        &request.input.project,
        &request.input.custom_prompt,
    )
    .await?;
    Ok(Json(improved))
}

/// POST /api/v1/ai/score
///
/// Tailored resumes are scored against their job, base resumes against their target role.
pub async fn handle_score_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AiRequest<ResumeInput>>,
) -> Result<Json<ResumeScore>, AppError> {
    let resume = owned_resume(&state, user.id, request.input.resume_id).await?;
    let job = match resume.job_id {
        Some(job_id) => get_job(&state.db, user.id, job_id).await?,
        None => None,
    };
    let target = prepare_model(&state, user.id, &request.ai_config).await?;

    let score =
        actions::score_resume(&state.llm, &target, &resume_prompt_json(&resume), job.as_ref())
            .await?;
    info!("Scored resume {}: {}", resume.id, score.overall_score);
    Ok(Json(score))
}

/// POST /api/v1/ai/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AiRequest<ChatInput>>,
) -> Result<Json<ChatResponse>, AppError> {
    let resume = owned_resume(&state, user.id, request.input.resume_id).await?;
    let target = prepare_model(&state, user.id, &request.ai_config).await?;
    let reply = actions::chat(
        &state.llm,
        &target,
        &resume_prompt_json(&resume),
        &request.input.messages,
    )
    .await?;
    Ok(Json(ChatResponse {
        message: ChatMessage {
            role: "assistant".to_string(),
            content: reply,
        },
    }))
}

/// POST /api/v1/resumes/:id/cover-letter
///
/// Generates a cover letter for a tailored resume's job and saves it on the resume.
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resume_id): Path<Uuid>,
    Json(request): Json<AiRequest<CoverLetterInput>>,
) -> Result<Json<CoverLetter>, AppError> {
    let resume = owned_resume(&state, user.id, resume_id).await?;
    let job_id = resume.job_id.ok_or_else(|| {
        AppError::Validation("Cover letters require a tailored resume with a job".to_string())
    })?;
    let job = owned_job(&state, user.id, job_id).await?;
    let target = prepare_model(&state, user.id, &request.ai_config).await?;

    let letter = actions::generate_cover_letter(
        &state.llm,
        &target,
        &resume_prompt_json(&resume),
        &job,
        &request.input.custom_prompt,
    )
    .await?;
    save_cover_letter(&state.db, user.id, resume.id, &json!({ "content": letter.content }))
        .await?;

    info!("Saved cover letter on resume {}", resume.id);
    Ok(Json(letter))
}

/// POST /api/v1/jobs/format
///
/// Turns a pasted job listing into a job draft. Nothing is saved.
pub async fn handle_format_job_listing(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AiRequest<TextInput>>,
) -> Result<Json<JobDraft>, AppError> {
    require_text(&request.input.text, "text")?;
    let target = prepare_model(&state, user.id, &request.ai_config).await?;
    let draft = actions::format_job_listing(&state.llm, &target, &request.input.text).await?;
    Ok(Json(draft))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_request_flattens_input() {
        let request: AiRequest<TextInput> = serde_json::from_str(
            r#"{"text":"Senior Rust Engineer at Acme","ai_config":{"model":"gpt-4.1"}}"#,
        )
        .unwrap();
        assert_eq!(request.input.text, "Senior Rust Engineer at Acme");
        assert_eq!(request.ai_config.model.as_deref(), Some("gpt-4.1"));
    }

    #[test]
    fn test_ai_config_is_optional() {
        let request: AiRequest<WorkPointsRequest> =
            serde_json::from_str(r#"{"position":"Engineer","company":"Acme"}"#).unwrap();
        assert!(request.ai_config.model.is_none());
        assert_eq!(request.input.num_points, 3);
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("  ", "text").is_err());
        assert!(require_text("listing", "text").is_ok());
    }
}
