use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::profile::{ContactInfo, ProfileRow};
use crate::models::sections::SectionContent;

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<ProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Contact and sections of the profile, empty when the user has none yet.
pub async fn load_profile_parts(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<(ContactInfo, SectionContent), sqlx::Error> {
    Ok(match get_profile(pool, user_id).await? {
        Some(row) => (ContactInfo::from(&row), row.sections()),
        None => (ContactInfo::default(), SectionContent::default()),
    })
}

/// Inserts or replaces the user's single profile row.
pub async fn upsert_profile(
    pool: &PgPool,
    user_id: Uuid,
    contact: &ContactInfo,
    sections: &SectionContent,
) -> Result<ProfileRow, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO profiles
            (user_id, first_name, last_name, email, phone_number, location, website,
             linkedin_url, github_url, work_experience, education, skills, projects)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (user_id) DO UPDATE SET
            first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            email = EXCLUDED.email,
            phone_number = EXCLUDED.phone_number,
            location = EXCLUDED.location,
            website = EXCLUDED.website,
            linkedin_url = EXCLUDED.linkedin_url,
            github_url = EXCLUDED.github_url,
            work_experience = EXCLUDED.work_experience,
            education = EXCLUDED.education,
            skills = EXCLUDED.skills,
            projects = EXCLUDED.projects,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&contact.first_name)
    .bind(&contact.last_name)
    .bind(&contact.email)
    .bind(&contact.phone_number)
    .bind(&contact.location)
    .bind(&contact.website)
    .bind(&contact.linkedin_url)
    .bind(&contact.github_url)
    .bind(Json(&sections.work_experience))
    .bind(Json(&sections.education))
    .bind(Json(&sections.skills))
    .bind(Json(&sections.projects))
    .fetch_one(pool)
    .await
}

/// Clears contact fields and all sections, keeping the row.
pub async fn reset_profile(pool: &PgPool, user_id: Uuid) -> Result<ProfileRow, sqlx::Error> {
    upsert_profile(
        pool,
        user_id,
        &ContactInfo::default(),
        &SectionContent::default(),
    )
    .await
}
