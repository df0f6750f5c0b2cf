use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::profile::ContactInfo;
use crate::models::resume::{ResumeKind, ResumeRow};
use crate::models::sections::{SectionConfigs, SectionContent};
use crate::pdf::settings::DocumentSettings;

/// Everything needed to insert a resume row.
pub struct NewResume {
    pub user_id: Uuid,
    pub job_id: Option<Uuid>,
    pub name: String,
    pub target_role: String,
    pub is_base_resume: bool,
    pub contact: ContactInfo,
    pub sections: SectionContent,
    pub document_settings: DocumentSettings,
    pub section_order: Vec<String>,
    pub section_configs: SectionConfigs,
}

impl NewResume {
    /// A copy of `source` owned by the same user, with the given identity fields.
    pub fn from_existing(source: &ResumeRow, name: String) -> Self {
        Self {
            user_id: source.user_id,
            job_id: source.job_id,
            name,
            target_role: source.target_role.clone(),
            is_base_resume: source.is_base_resume,
            contact: source.contact(),
            sections: source.sections(),
            document_settings: source.document_settings.0.clone(),
            section_order: source.section_order.clone(),
            section_configs: source.section_configs.0.clone(),
        }
    }
}

pub async fn insert_resume(pool: &PgPool, new: NewResume) -> Result<ResumeRow, sqlx::Error> {
    let NewResume {
        user_id,
        job_id,
        name,
        target_role,
        is_base_resume,
        contact,
        sections,
        document_settings,
        section_order,
        section_configs,
    } = new;

    sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes
            (user_id, job_id, name, target_role, is_base_resume,
             first_name, last_name, email, phone_number, location, website,
             linkedin_url, github_url,
             work_experience, education, skills, projects,
             document_settings, section_order, section_configs)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(job_id)
    .bind(name)
    .bind(target_role)
    .bind(is_base_resume)
    .bind(contact.first_name)
    .bind(contact.last_name)
    .bind(contact.email)
    .bind(contact.phone_number)
    .bind(contact.location)
    .bind(contact.website)
    .bind(contact.linkedin_url)
    .bind(contact.github_url)
    .bind(Json(sections.work_experience))
    .bind(Json(sections.education))
    .bind(Json(sections.skills))
    .bind(Json(sections.projects))
    .bind(Json(document_settings))
    .bind(section_order)
    .bind(Json(section_configs))
    .fetch_one(pool)
    .await
}

/// Newest first. `kind = None` lists both base and tailored resumes.
pub async fn list_resumes(
    pool: &PgPool,
    user_id: Uuid,
    kind: Option<ResumeKind>,
) -> Result<Vec<ResumeRow>, sqlx::Error> {
    let is_base = kind.map(|k| k == ResumeKind::Base);
    sqlx::query_as::<_, ResumeRow>(
        r#"
        SELECT * FROM resumes
        WHERE user_id = $1 AND ($2::boolean IS NULL OR is_base_resume = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(is_base)
    .fetch_all(pool)
    .await
}

pub async fn get_resume(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<Option<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(resume_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Writes back every mutable column of an already-patched row.
pub async fn save_resume(pool: &PgPool, resume: &ResumeRow) -> Result<ResumeRow, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>(
        r#"
        UPDATE resumes SET
            job_id = $3, name = $4, target_role = $5, is_base_resume = $6,
            first_name = $7, last_name = $8, email = $9, phone_number = $10,
            location = $11, website = $12, linkedin_url = $13, github_url = $14,
            work_experience = $15, education = $16, skills = $17, projects = $18,
            document_settings = $19, section_order = $20, section_configs = $21,
            updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(resume.id)
    .bind(resume.user_id)
    .bind(resume.job_id)
    .bind(&resume.name)
    .bind(&resume.target_role)
    .bind(resume.is_base_resume)
    .bind(&resume.first_name)
    .bind(&resume.last_name)
    .bind(&resume.email)
    .bind(&resume.phone_number)
    .bind(&resume.location)
    .bind(&resume.website)
    .bind(&resume.linkedin_url)
    .bind(&resume.github_url)
    .bind(&resume.work_experience)
    .bind(&resume.education)
    .bind(&resume.skills)
    .bind(&resume.projects)
    .bind(&resume.document_settings)
    .bind(&resume.section_order)
    .bind(&resume.section_configs)
    .fetch_one(pool)
    .await
}

/// Deletes the resume and, when `delete_job` is set and the resume is tailored,
/// its job in the same transaction. Returns false when nothing matched.
pub async fn delete_resume(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
    delete_job: bool,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let job_id: Option<Option<Uuid>> = sqlx::query_scalar(
        "DELETE FROM resumes WHERE id = $1 AND user_id = $2 RETURNING job_id",
    )
    .bind(resume_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(job_id) = job_id else {
        return Ok(false);
    };

    if let (true, Some(job_id)) = (delete_job, job_id) {
        sqlx::query("DELETE FROM jobs WHERE id = $1 AND user_id = $2")
            .bind(job_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(true)
}

pub async fn count_resumes(
    pool: &PgPool,
    user_id: Uuid,
    kind: Option<ResumeKind>,
) -> Result<i64, sqlx::Error> {
    let is_base = kind.map(|k| k == ResumeKind::Base);
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM resumes WHERE user_id = $1 AND ($2::boolean IS NULL OR is_base_resume = $2)",
    )
    .bind(user_id)
    .bind(is_base)
    .fetch_one(pool)
    .await
}

pub async fn save_cover_letter(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
    cover_letter: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE resumes
        SET cover_letter = $3, has_cover_letter = true, updated_at = now()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(resume_id)
    .bind(user_id)
    .bind(cover_letter)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_pdf_key(pool: &PgPool, resume_id: Uuid, key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE resumes SET s3_pdf_key = $2 WHERE id = $1")
        .bind(resume_id)
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}
