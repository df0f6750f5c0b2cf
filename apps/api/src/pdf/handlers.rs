//! Axum route handlers for resume PDFs.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::pdf::document::RenderInput;
use crate::pdf::service::{archive_pdf, pdf_key, render_pdf};
use crate::pdf::styles::{build_style_sheet, StyleSheet};
use crate::resumes::handlers::owned_resume;
use crate::resumes::repo::set_pdf_key;
use crate::state::AppState;

/// GET /api/v1/resumes/:id/pdf
///
/// Serves the rendered PDF. Fresh renders are archived to S3; an archive failure is
/// logged and the PDF is still returned.
pub async fn handle_resume_pdf(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let resume = owned_resume(&state, user.id, resume_id).await?;
    let input = RenderInput::from(&resume);
    let rendered = render_pdf(state.renderer.as_ref(), &state.pdf_cache, &input).await?;

    if rendered.fresh || resume.s3_pdf_key.is_none() {
        let key = pdf_key(user.id, resume.id);
        match archive_pdf(&state.s3, &state.config.s3_bucket, &key, rendered.pdf.clone()).await {
            Ok(()) => set_pdf_key(&state.db, resume.id, &key).await?,
            Err(e) => warn!("Serving resume {} without archiving: {e}", resume.id),
        }
    } else {
        info!("Served resume {} from PDF cache", resume.id);
    }

    let filename = download_name(&resume.name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{filename}\""),
            ),
        ],
        rendered.pdf,
    )
        .into_response())
}

/// GET /api/v1/resumes/:id/style
///
/// The concrete point values the PDF will be rendered with, for the editor preview.
pub async fn handle_resume_style(
    State(state): State<AppState>,
    user: AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<StyleSheet>, AppError> {
    let resume = owned_resume(&state, user.id, resume_id).await?;
    Ok(Json(build_style_sheet(&resume.document_settings.0)))
}

/// ASCII-only file name safe inside a quoted header value.
fn download_name(resume_name: &str) -> String {
    let stem: String = resume_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "resume.pdf".to_string()
    } else {
        format!("{stem}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_name_sanitizes() {
        assert_eq!(download_name("Backend Résumé"), "Backend_R_sum.pdf");
        assert_eq!(download_name("\"quoted\""), "quoted.pdf");
        assert_eq!(download_name("   "), "resume.pdf");
    }
}
