//! Axum route handlers for the Jobs API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{ActionResult, AppError};
use crate::jobs::repo::{self, page_bounds, JobFilters, JobPage};
use crate::models::job::{EmploymentType, JobDraft, JobPatch, JobRow, WorkLocation};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub work_location: Option<WorkLocation>,
    pub employment_type: Option<EmploymentType>,
    /// Comma-separated.
    pub keywords: Option<String>,
    /// Comma-separated job ids. When present, paging and filters are ignored.
    pub ids: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_ids(raw: &str) -> Result<Vec<Uuid>, AppError> {
    split_csv(Some(raw))
        .iter()
        .map(|id| {
            Uuid::parse_str(id).map_err(|_| AppError::Validation(format!("Invalid job id '{id}'")))
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/jobs?page=&page_size=&work_location=&employment_type=&keywords=a,b
/// GET /api/v1/jobs?ids=<uuid>,<uuid>
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<JobPage>, AppError> {
    if let Some(ids) = query.ids.as_deref() {
        let ids = parse_ids(ids)?;
        let jobs = repo::get_jobs_by_ids(&state.db, user.id, &ids).await?;
        let total_pages = i64::from(!jobs.is_empty());
        return Ok(Json(JobPage {
            jobs,
            total_pages,
            current_page: 1,
        }));
    }

    let (page, page_size) = page_bounds(query.page, query.page_size);
    let filters = JobFilters {
        work_location: query.work_location,
        employment_type: query.employment_type,
        keywords: split_csv(query.keywords.as_deref()),
    };
    let page = repo::list_jobs(&state.db, user.id, page, page_size, &filters).await?;
    Ok(Json(page))
}

/// GET /api/v1/jobs/count
pub async fn handle_count_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CountResponse>, AppError> {
    let count = repo::count_jobs(&state.db, user.id).await?;
    Ok(Json(CountResponse { count }))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(draft): Json<JobDraft>,
) -> Result<Json<JobRow>, AppError> {
    draft.validate().map_err(AppError::Validation)?;
    let job = repo::create_job(&state.db, user.id, &draft).await?;
    info!(
        "Created job {} ({} at {}) for user {}",
        job.id, job.position_title, job.company_name, user.id
    );
    Ok(Json(job))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let job = repo::get_job(&state.db, user.id, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// PATCH /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
    Json(patch): Json<JobPatch>,
) -> Result<Json<JobRow>, AppError> {
    let mut job = repo::get_job(&state.db, user.id, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    patch.apply(&mut job).map_err(AppError::Validation)?;
    Ok(Json(repo::save_job(&state.db, &job).await?))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ActionResult>, AppError> {
    if !repo::delete_job(&state.db, user.id, job_id).await? {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }
    info!("Deleted job {job_id}");
    Ok(Json(ActionResult::ok("Job deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_csv_drops_blanks() {
        assert_eq!(
            split_csv(Some(" rust, ,sql ,")),
            vec!["rust".to_string(), "sql".to_string()]
        );
        assert!(split_csv(None).is_empty());
    }

    #[test]
    fn test_parse_ids_rejects_garbage() {
        let id = Uuid::new_v4();
        assert_eq!(parse_ids(&id.to_string()).unwrap(), vec![id]);
        assert!(matches!(
            parse_ids("not-a-uuid"),
            Err(AppError::Validation(_))
        ));
    }
}
