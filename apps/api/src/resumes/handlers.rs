//! Axum route handlers for the Resume API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{ActionResult, AppError};
use crate::jobs::repo::get_job;
use crate::models::resume::{ResumeKind, ResumePatch, ResumeRow};
use crate::models::sections::SectionContent;
use crate::profiles::repo::load_profile_parts;
use crate::resumes::builder::{
    copy_name, new_base_resume, new_tailored_resume, select_sections, ImportOption,
};
use crate::resumes::repo::{self, NewResume};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct KindQuery {
    pub kind: Option<ResumeKind>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBaseResumeRequest {
    pub name: String,
    #[serde(default)]
    pub target_role: String,
    #[serde(alias = "importOption")]
    pub import_option: ImportOption,
    /// Section keys to copy. Absent copies all of them.
    #[serde(default)]
    pub selected_sections: Option<Vec<String>>,
    /// Source base resume for `import-resume`.
    #[serde(default)]
    pub source_resume_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTailoredResumeRequest {
    pub base_resume_id: Uuid,
    #[serde(default)]
    pub job_id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_role: Option<String>,
    /// Already-tailored content, e.g. from `/api/v1/ai/tailor`.
    #[serde(default)]
    pub sections: Option<SectionContent>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteResumeQuery {
    #[serde(default)]
    pub delete_job: bool,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct SaveCoverLetterRequest {
    pub content: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared lookups
// ────────────────────────────────────────────────────────────────────────────

/// The caller's resume, or 404 when it does not exist or belongs to someone else.
pub async fn owned_resume(
    state: &AppState,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<ResumeRow, AppError> {
    repo::get_resume(&state.db, user_id, resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes?kind=base|tailored
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    let resumes = repo::list_resumes(&state.db, user.id, query.kind).await?;
    Ok(Json(resumes))
}

/// GET /api/v1/resumes/count?kind=base|tailored
pub async fn handle_count_resumes(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<KindQuery>,
) -> Result<Json<CountResponse>, AppError> {
    let count = repo::count_resumes(&state.db, user.id, query.kind).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeRow>, AppError> {
    Ok(Json(owned_resume(&state, user.id, resume_id).await?))
}

/// POST /api/v1/resumes
///
/// Creates a base resume from the profile, from another base resume, or empty.
pub async fn handle_create_base_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateBaseResumeRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    let (contact, content) = match request.import_option {
        ImportOption::Fresh => Default::default(),
        ImportOption::ImportProfile => load_profile_parts(&state.db, user.id).await?,
        ImportOption::ImportResume => {
            let source_id = request.source_resume_id.ok_or_else(|| {
                AppError::Validation("source_resume_id is required for import-resume".to_string())
            })?;
            let source = owned_resume(&state, user.id, source_id).await?;
            if !source.is_base_resume {
                return Err(AppError::Validation(
                    "Only base resumes can be imported".to_string(),
                ));
            }
            (source.contact(), source.sections())
        }
    };

    let sections = select_sections(content, request.selected_sections.as_deref());
    let new = new_base_resume(
        user.id,
        request.name.trim().to_string(),
        request.target_role,
        contact,
        sections,
    );
    let resume = repo::insert_resume(&state.db, new).await?;

    info!(
        "Created base resume {} for user {} ({:?})",
        resume.id, user.id, request.import_option
    );
    Ok(Json(resume))
}

/// POST /api/v1/resumes/tailored
///
/// Copies a base resume and links it to a job. The job is required.
pub async fn handle_create_tailored_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateTailoredResumeRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    let job_id = request.job_id.ok_or_else(|| {
        AppError::Validation("job_id is required for a tailored resume".to_string())
    })?;

    let (base, job) = tokio::try_join!(
        owned_resume(&state, user.id, request.base_resume_id),
        async {
            get_job(&state.db, user.id, job_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
        }
    )?;

    if !base.is_base_resume {
        return Err(AppError::Validation(
            "Tailored resumes must be created from a base resume".to_string(),
        ));
    }

    let name = request
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("{} - {}", job.position_title, job.company_name));
    let new = new_tailored_resume(&base, job.id, name, request.target_role, request.sections);
    let resume = repo::insert_resume(&state.db, new).await?;

    info!(
        "Created tailored resume {} from base {} for job {}",
        resume.id, base.id, job.id
    );
    Ok(Json(resume))
}

/// PATCH /api/v1/resumes/:id
pub async fn handle_update_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resume_id): Path<Uuid>,
    Json(patch): Json<ResumePatch>,
) -> Result<Json<ResumeRow>, AppError> {
    let mut resume = owned_resume(&state, user.id, resume_id).await?;

    if let Some(Some(job_id)) = patch.job_id {
        if get_job(&state.db, user.id, job_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Job {job_id} not found")));
        }
    }

    patch.apply(&mut resume).map_err(AppError::Validation)?;
    let saved = repo::save_resume(&state.db, &resume).await?;
    Ok(Json(saved))
}

/// DELETE /api/v1/resumes/:id?delete_job=true
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resume_id): Path<Uuid>,
    Query(query): Query<DeleteResumeQuery>,
) -> Result<Json<ActionResult>, AppError> {
    let deleted = repo::delete_resume(&state.db, user.id, resume_id, query.delete_job).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Resume {resume_id} not found")));
    }
    info!("Deleted resume {resume_id} (delete_job: {})", query.delete_job);
    Ok(Json(ActionResult::ok("Resume deleted")))
}

/// POST /api/v1/resumes/:id/copy
pub async fn handle_copy_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeRow>, AppError> {
    let source = owned_resume(&state, user.id, resume_id).await?;
    let copy = NewResume::from_existing(&source, copy_name(&source.name));
    let resume = repo::insert_resume(&state.db, copy).await?;
    info!("Copied resume {} to {}", source.id, resume.id);
    Ok(Json(resume))
}

/// PUT /api/v1/resumes/:id/cover-letter
///
/// Saves a user-edited cover letter. Generation lives under POST on the same path.
pub async fn handle_save_cover_letter(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resume_id): Path<Uuid>,
    Json(request): Json<SaveCoverLetterRequest>,
) -> Result<Json<ActionResult>, AppError> {
    owned_resume(&state, user.id, resume_id).await?;
    repo::save_cover_letter(
        &state.db,
        user.id,
        resume_id,
        &json!({ "content": request.content }),
    )
    .await?;
    Ok(Json(ActionResult::ok("Cover letter saved")))
}
