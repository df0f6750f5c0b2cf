use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::job::{EmploymentType, JobDraft, JobRow, WorkLocation};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Keeps `(page - 1) * page_size` inside an i64 OFFSET.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

#[derive(Debug, Clone, Default)]
pub struct JobFilters {
    pub work_location: Option<WorkLocation>,
    pub employment_type: Option<EmploymentType>,
    /// Matches jobs sharing at least one keyword.
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct JobPage {
    pub jobs: Vec<JobRow>,
    pub total_pages: i64,
    pub current_page: i64,
}

/// Clamps raw query values to a 1-based page and a bounded page size.
pub fn page_bounds(page: Option<i64>, page_size: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + page_size - 1) / page_size
    }
}

pub async fn create_job(
    pool: &PgPool,
    user_id: Uuid,
    draft: &JobDraft,
) -> Result<JobRow, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs
            (user_id, company_name, position_title, job_url, description, location,
             salary_range, keywords, work_location, employment_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(draft.company_name.trim())
    .bind(draft.position_title.trim())
    .bind(&draft.job_url)
    .bind(&draft.description)
    .bind(&draft.location)
    .bind(&draft.salary_range)
    .bind(&draft.keywords)
    .bind(draft.work_location.map(|w| w.as_str()))
    .bind(draft.employment_type.map(|e| e.as_str()))
    .fetch_one(pool)
    .await
}

pub async fn get_job(
    pool: &PgPool,
    user_id: Uuid,
    job_id: Uuid,
) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1 AND user_id = $2")
        .bind(job_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn save_job(pool: &PgPool, job: &JobRow) -> Result<JobRow, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs SET
            company_name = $3, position_title = $4, job_url = $5, description = $6,
            location = $7, salary_range = $8, keywords = $9, work_location = $10,
            employment_type = $11, is_active = $12, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(job.id)
    .bind(job.user_id)
    .bind(&job.company_name)
    .bind(&job.position_title)
    .bind(&job.job_url)
    .bind(&job.description)
    .bind(&job.location)
    .bind(&job.salary_range)
    .bind(&job.keywords)
    .bind(&job.work_location)
    .bind(&job.employment_type)
    .bind(job.is_active)
    .fetch_one(pool)
    .await
}

/// Tailored resumes pointing at the job go with it (`ON DELETE CASCADE`).
pub async fn delete_job(pool: &PgPool, user_id: Uuid, job_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM jobs WHERE id = $1 AND user_id = $2")
        .bind(job_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_jobs(
    pool: &PgPool,
    user_id: Uuid,
    page: i64,
    page_size: i64,
    filters: &JobFilters,
) -> Result<JobPage, sqlx::Error> {
    const FILTER: &str = r#"
        WHERE user_id = $1
          AND ($2::text IS NULL OR work_location = $2)
          AND ($3::text IS NULL OR employment_type = $3)
          AND (cardinality($4::text[]) = 0 OR keywords && $4)
    "#;

    let work_location = filters.work_location.map(|w| w.as_str());
    let employment_type = filters.employment_type.map(|e| e.as_str());

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM jobs {FILTER}"))
        .bind(user_id)
        .bind(work_location)
        .bind(employment_type)
        .bind(&filters.keywords)
        .fetch_one(pool)
        .await?;

    let jobs = sqlx::query_as::<_, JobRow>(&format!(
        "SELECT * FROM jobs {FILTER} ORDER BY created_at DESC LIMIT $5 OFFSET $6"
    ))
    .bind(user_id)
    .bind(work_location)
    .bind(employment_type)
    .bind(&filters.keywords)
    .bind(page_size)
    .bind((page - 1).saturating_mul(page_size))
    .fetch_all(pool)
    .await?;

    Ok(JobPage {
        jobs,
        total_pages: total_pages(total, page_size),
        current_page: page,
    })
}

/// Jobs owned by the user among `ids`. Unknown ids are skipped.
pub async fn get_jobs_by_ids(
    pool: &PgPool,
    user_id: Uuid,
    ids: &[Uuid],
) -> Result<Vec<JobRow>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE user_id = $1 AND id = ANY($2) ORDER BY created_at DESC",
    )
    .bind(user_id)
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub async fn count_jobs(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn test_page_bounds_clamp() {
        assert_eq!(page_bounds(None, None), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(page_bounds(Some(0), Some(0)), (1, 1));
        assert_eq!(page_bounds(Some(3), Some(10_000)), (3, MAX_PAGE_SIZE));
    }

    #[test]
    fn test_huge_page_keeps_offset_in_range() {
        let (page, page_size) = page_bounds(Some(i64::MAX), Some(MAX_PAGE_SIZE));
        assert_eq!(page, MAX_PAGE);
        assert!((page - 1).checked_mul(page_size).is_some_and(|offset| offset >= 0));
    }
}
