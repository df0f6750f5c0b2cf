//! Axum route handlers for the Profile API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::actions::{text_import, ImportedProfile};
use crate::ai::handlers::{require_text, AiRequest};
use crate::ai::model_selection::AiConfig;
use crate::ai::prepare_model;
use crate::auth::AuthUser;
use crate::errors::{ActionResult, AppError};
use crate::models::profile::{ProfilePatch, ProfileRow};
use crate::profiles::repo::{get_profile, load_profile_parts, reset_profile, upsert_profile};
use crate::resumes::handlers::owned_resume;
use crate::state::AppState;

/// Uploaded resumes larger than this are rejected before text extraction.
pub const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;
/// Request body cap for the PDF import route: the file plus multipart framing and
/// the small text fields.
pub const PDF_UPLOAD_BODY_LIMIT: usize = MAX_PDF_BYTES + 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct TextImportInput {
    pub text: String,
}

/// Merges imported content into the stored profile. Existing contact values win.
async fn merge_into_profile(
    state: &AppState,
    user_id: Uuid,
    imported: ImportedProfile,
) -> Result<ProfileRow, AppError> {
    let (mut contact, mut sections) = load_profile_parts(&state.db, user_id).await?;
    contact.fill_missing(&imported.contact);
    sections.merge(imported.sections);
    Ok(upsert_profile(&state.db, user_id, &contact, &sections).await?)
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileRow>, AppError> {
    let profile = get_profile(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(profile))
}

/// PUT /api/v1/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<ProfileRow>, AppError> {
    let (mut contact, mut sections) = load_profile_parts(&state.db, user.id).await?;
    patch.apply(&mut contact, &mut sections);
    let profile = upsert_profile(&state.db, user.id, &contact, &sections).await?;
    Ok(Json(profile))
}

/// DELETE /api/v1/profile
///
/// Clears the profile's contents. The row itself is kept.
pub async fn handle_reset_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ActionResult>, AppError> {
    reset_profile(&state.db, user.id).await?;
    info!("Reset profile for user {}", user.id);
    Ok(Json(ActionResult::ok("Profile reset")))
}

/// POST /api/v1/profile/import/resume/:id
pub async fn handle_import_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ProfileRow>, AppError> {
    let resume = owned_resume(&state, user.id, resume_id).await?;
    let imported = ImportedProfile {
        contact: resume.contact(),
        sections: resume.sections(),
    };
    let profile = merge_into_profile(&state, user.id, imported).await?;
    info!("Imported resume {resume_id} into profile of user {}", user.id);
    Ok(Json(profile))
}

/// POST /api/v1/profile/import/text
pub async fn handle_import_text(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AiRequest<TextImportInput>>,
) -> Result<Json<ProfileRow>, AppError> {
    require_text(&request.input.text, "text")?;
    let target = prepare_model(&state, user.id, &request.ai_config).await?;
    let imported = text_import(&state.llm, &target, &request.input.text).await?;
    Ok(Json(merge_into_profile(&state, user.id, imported).await?))
}

/// POST /api/v1/profile/import/pdf (multipart: `file`, optional `model`, `api_key`)
pub async fn handle_import_pdf(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ProfileRow>, AppError> {
    let mut file: Option<Bytes> = None;
    let mut ai_config = AiConfig::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let read_err = |e: axum::extract::multipart::MultipartError| {
            AppError::Validation(format!("Failed to read field '{name}': {e}"))
        };
        match name.as_str() {
            "file" => file = Some(field.bytes().await.map_err(read_err)?),
            "model" => ai_config.model = Some(field.text().await.map_err(read_err)?),
            "api_key" => ai_config.api_key = Some(field.text().await.map_err(read_err)?),
            other => warn!("Ignoring unexpected multipart field '{other}'"),
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    let text = extract_pdf_text(file).await?;
    let target = prepare_model(&state, user.id, &ai_config).await?;
    let imported = text_import(&state.llm, &target, &text).await?;

    info!("Imported PDF resume into profile of user {}", user.id);
    Ok(Json(merge_into_profile(&state, user.id, imported).await?))
}

/// Extracts text off the async runtime. Scanned PDFs without a text layer are rejected.
pub async fn extract_pdf_text(file: Bytes) -> Result<String, AppError> {
    if file.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if file.len() > MAX_PDF_BYTES {
        return Err(AppError::Validation(format!(
            "PDF exceeds the {} MB limit",
            MAX_PDF_BYTES / (1024 * 1024)
        )));
    }
    if !file.starts_with(b"%PDF") {
        return Err(AppError::Validation("Uploaded file is not a PDF".to_string()));
    }

    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&file))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?;

    if text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "The PDF has no extractable text".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extract_rejects_non_pdf() {
        let err = extract_pdf_text(Bytes::from_static(b"hello")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_extract_rejects_empty_upload() {
        let err = extract_pdf_text(Bytes::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_extract_rejects_corrupt_pdf() {
        let err = extract_pdf_text(Bytes::from_static(b"%PDF-1.4 garbage"))
            .await
            .unwrap_err();
        // A parser panic surfaces as a failed blocking task.
        assert!(matches!(
            err,
            AppError::UnprocessableEntity(_) | AppError::Internal(_)
        ));
    }
}
