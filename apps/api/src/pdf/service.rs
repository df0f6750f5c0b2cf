use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::pdf::cache::{cache_key, PdfCache};
use crate::pdf::document::{build_document, RenderInput};
use crate::pdf::renderer::PdfRenderer;
use crate::pdf::styles::build_style_sheet;

pub struct RenderedPdf {
    pub pdf: Bytes,
    /// False when the bytes came from the cache.
    pub fresh: bool,
}

/// S3 archive location for a resume's latest PDF.
pub fn pdf_key(user_id: Uuid, resume_id: Uuid) -> String {
    format!("pdfs/{user_id}/{resume_id}.pdf")
}

/// Renders through the cache. Identical input returns the cached bytes without
/// touching the engine.
pub async fn render_pdf(
    renderer: &dyn PdfRenderer,
    cache: &PdfCache,
    input: &RenderInput,
) -> Result<RenderedPdf, AppError> {
    let key = cache_key(input)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash render input: {e}")))?;

    if let Some(pdf) = cache.get(&key).await {
        return Ok(RenderedPdf { pdf, fresh: false });
    }

    let style = build_style_sheet(&input.document_settings);
    let source = build_document(input, &style);
    let pdf = renderer
        .render(&source)
        .await
        .map_err(|e| AppError::Render(e.to_string()))?;

    cache.insert(key, pdf.clone()).await;
    Ok(RenderedPdf { pdf, fresh: true })
}

pub async fn archive_pdf(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    pdf: Bytes,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(pdf))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("PDF upload failed: {e}")))?;

    info!("Uploaded resume PDF to s3://{bucket}/{key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::models::profile::ContactInfo;
    use crate::models::sections::{default_section_order, SectionConfigs, SectionContent};
    use crate::pdf::cache::DEFAULT_TTL;
    use crate::pdf::renderer::RenderError;
    use crate::pdf::settings::DocumentSettings;

    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PdfRenderer for CountingRenderer {
        async fn render(&self, latex_source: &str) -> Result<Bytes, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from(format!("%PDF-fake {}", latex_source.len())))
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl PdfRenderer for FailingRenderer {
        async fn render(&self, _latex_source: &str) -> Result<Bytes, RenderError> {
            Err(RenderError::EngineFailed {
                engine: "tectonic".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "! Undefined control sequence.".to_string(),
            })
        }
    }

    fn input() -> RenderInput {
        RenderInput {
            contact: ContactInfo {
                first_name: Some("Ada".to_string()),
                last_name: Some("Lovelace".to_string()),
                ..Default::default()
            },
            target_role: "Engineer".to_string(),
            sections: SectionContent::default(),
            section_order: default_section_order(),
            section_configs: SectionConfigs::new(),
            document_settings: DocumentSettings::default(),
        }
    }

    #[tokio::test]
    async fn test_second_render_hits_cache() {
        let renderer = CountingRenderer::default();
        let cache = PdfCache::new(DEFAULT_TTL);

        let first = render_pdf(&renderer, &cache, &input()).await.unwrap();
        let second = render_pdf(&renderer, &cache, &input()).await.unwrap();

        assert!(first.fresh);
        assert!(!second.fresh);
        assert_eq!(first.pdf, second.pdf);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_settings_change_rerenders() {
        let renderer = CountingRenderer::default();
        let cache = PdfCache::new(DEFAULT_TTL);

        render_pdf(&renderer, &cache, &input()).await.unwrap();
        let mut changed = input();
        changed.document_settings.document_font_size = 11.0;
        render_pdf(&renderer, &cache, &changed).await.unwrap();

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_engine_failure_is_render_error_and_not_cached() {
        let cache = PdfCache::new(DEFAULT_TTL);
        let err = render_pdf(&FailingRenderer, &cache, &input())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Render(_)));
        assert_eq!(cache.len().await, 0);
    }

    #[test]
    fn test_pdf_key_layout() {
        let user = Uuid::nil();
        let resume = Uuid::from_u128(1);
        assert_eq!(
            pdf_key(user, resume),
            format!("pdfs/{user}/{resume}.pdf")
        );
    }
}
